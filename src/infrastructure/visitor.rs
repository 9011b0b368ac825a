//! Field visitors for tracing spans and events.
//!
//! `SpanFieldVisitor` stores span fields so the layer can find an explicit
//! context key (a connection id, say) in the span scope. `EventVisitor`
//! turns an event into the format text plus ordered argument list the spam
//! filter evaluates.

use crate::domain::argument::LogArg;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use tracing::field::{Field, Visit};

/// Span fields stored in span extensions, keyed by field name.
#[derive(Debug, Clone, Default)]
pub(crate) struct SpanFields(pub(crate) BTreeMap<&'static str, String>);

/// Collects span field values as strings.
#[derive(Debug, Default)]
pub(crate) struct SpanFieldVisitor {
    fields: BTreeMap<&'static str, String>,
}

impl SpanFieldVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_fields(self) -> SpanFields {
        SpanFields(self.fields)
    }
}

impl Visit for SpanFieldVisitor {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name(), value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name(), value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name(), value.to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields.insert(field.name(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.fields.insert(field.name(), format!("{:?}", value));
    }
}

/// An error recorded from an event field, kept by its rendered message.
#[derive(Debug, Clone)]
pub(crate) struct RecordedError(String);

impl fmt::Display for RecordedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for RecordedError {}

/// An event field in recording order.
#[derive(Debug, Clone)]
pub(crate) enum RecordedArg {
    Error(RecordedError),
    Value(String),
}

/// Extracts the message and the ordered field list of an event.
///
/// Fields recorded through `record_error` become error arguments. All other
/// fields, including errors passed with `?` or `%`, are plain values.
#[derive(Debug, Default)]
pub(crate) struct EventVisitor {
    message: Option<String>,
    args: Vec<RecordedArg>,
}

impl EventVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The event message, or an empty string for message-less events.
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }

    /// Borrow the recorded fields as filter arguments.
    pub fn args(&self) -> Vec<LogArg<'_>> {
        self.args
            .iter()
            .map(|arg| match arg {
                RecordedArg::Error(err) => LogArg::Error(err),
                RecordedArg::Value(value) => LogArg::Value(value),
            })
            .collect()
    }

    fn push_value(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.args.push(RecordedArg::Value(value));
        }
    }
}

impl Visit for EventVisitor {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push_value(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push_value(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push_value(field, value.to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push_value(field, value.to_string());
    }

    fn record_error(&mut self, _field: &Field, value: &(dyn Error + 'static)) {
        self.args
            .push(RecordedArg::Error(RecordedError(value.to_string())));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push_value(field, format!("{:?}", value));
    }
}
