//! Tracing integration layer.
//!
//! Provides a `tracing_subscriber` filter that drops repeated `WARN` events
//! matching a noise rule, per execution context.

use crate::application::{
    filter::{DefaultStorage, SpamFilter},
    metrics::Metrics,
    ports::{Clock, ContextSource},
};
use crate::domain::{context::ContextId, rule::NoiseRule};
use crate::infrastructure::visitor::{EventVisitor, SpanFieldVisitor, SpanFields};

use std::sync::Arc;
use tracing::{Level, Metadata, Subscriber};
use tracing_subscriber::layer::Filter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::Context, Layer};

/// Error returned when building a `SpamFilterLayer` fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The span field used as context key must have a name
    EmptyContextField,
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::EmptyContextField => {
                write!(f, "context field name must not be empty")
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// Builder for constructing a `SpamFilterLayer`.
pub struct SpamFilterLayerBuilder {
    rule: NoiseRule,
    clock: Option<Arc<dyn Clock>>,
    contexts: Option<Arc<dyn ContextSource>>,
    context_field: Option<String>,
}

impl SpamFilterLayerBuilder {
    /// Set the noise rule applied to `WARN` events.
    pub fn with_rule(mut self, rule: NoiseRule) -> Self {
        self.rule = rule;
        self
    }

    /// Set a custom clock (mainly for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the fallback source of context identifiers.
    ///
    /// Used when no context field is configured or none is found in the
    /// current span scope. Default: the calling thread.
    pub fn with_context_source(mut self, contexts: Arc<dyn ContextSource>) -> Self {
        self.contexts = Some(contexts);
        self
    }

    /// Key suppression by a span field instead of the calling thread.
    ///
    /// The innermost span in the current scope that carries the field
    /// decides the context. Use this when one thread serves many
    /// connections, so each connection gets its own window.
    ///
    /// The layer must also be installed as a `Layer` (see
    /// [`SpamFilterLayer`]) so span fields are recorded.
    ///
    /// ```no_run
    /// # use tracing_spam_filter::SpamFilterLayer;
    /// let layer = SpamFilterLayer::builder()
    ///     .with_context_field("conn_id")
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn with_context_field(mut self, field: impl Into<String>) -> Self {
        self.context_field = Some(field.into());
        self
    }

    /// Build the layer.
    ///
    /// # Errors
    /// Returns `BuildError` if the configuration is invalid.
    pub fn build(self) -> Result<SpamFilterLayer, BuildError> {
        if let Some(field) = &self.context_field {
            if field.is_empty() {
                return Err(BuildError::EmptyContextField);
            }
        }

        let mut builder = SpamFilter::builder();
        if let Some(clock) = self.clock {
            builder = builder.with_clock(clock);
        }
        if let Some(contexts) = self.contexts {
            builder = builder.with_context_source(contexts);
        }

        Ok(SpamFilterLayer {
            filter: builder.build(),
            rule: Arc::new(self.rule),
            context_field: self.context_field.map(Arc::from),
        })
    }
}

/// A `tracing` filter that suppresses repeated noisy warnings.
///
/// `WARN` events whose message matches the rule's format pattern and whose
/// first error field (recorded via `&dyn Error`) matches the argument
/// pattern are let through once per window per context. All other events
/// pass.
///
/// Install it as a per-layer filter. When keying by a span field, also add a
/// clone as a layer so span fields are stored; both share state.
///
/// ```no_run
/// use tracing_spam_filter::SpamFilterLayer;
/// use tracing_subscriber::prelude::*;
///
/// let spam = SpamFilterLayer::builder()
///     .with_context_field("conn_id")
///     .build()
///     .unwrap();
///
/// tracing_subscriber::registry()
///     .with(spam.clone())
///     .with(tracing_subscriber::fmt::layer().with_filter(spam))
///     .init();
/// ```
#[derive(Clone)]
pub struct SpamFilterLayer {
    filter: SpamFilter<DefaultStorage>,
    rule: Arc<NoiseRule>,
    context_field: Option<Arc<str>>,
}

impl SpamFilterLayer {
    /// Create a builder for configuring the layer.
    ///
    /// Defaults:
    /// - Rule: `NoiseRule::transport_failure()` (one minute window)
    /// - Context: the calling thread
    pub fn builder() -> SpamFilterLayerBuilder {
        SpamFilterLayerBuilder {
            rule: NoiseRule::transport_failure(),
            clock: None,
            contexts: None,
            context_field: None,
        }
    }

    /// Create a layer with default settings.
    pub fn new() -> Self {
        Self::builder()
            .build()
            .expect("default configuration is always valid")
    }

    /// Resolve the context for an event: the configured span field if
    /// present in scope, otherwise the fallback source.
    fn resolve_context<Sub>(&self, cx: &Context<'_, Sub>) -> ContextId
    where
        Sub: Subscriber + for<'lookup> LookupSpan<'lookup>,
    {
        if let Some(field) = self.context_field.as_deref() {
            if let Some(span) = cx.lookup_current() {
                for span_ref in span.scope() {
                    let extensions = span_ref.extensions();
                    if let Some(value) = extensions
                        .get::<SpanFields>()
                        .and_then(|stored| stored.0.get(field))
                    {
                        return ContextId::from_key(value);
                    }
                }
            }
        }
        self.filter.current_context()
    }

    /// Get a reference to the underlying filter.
    pub fn filter(&self) -> &SpamFilter<DefaultStorage> {
        &self.filter
    }

    /// Get the active rule.
    pub fn rule(&self) -> &NoiseRule {
        &self.rule
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        self.filter.metrics()
    }

    /// Number of contexts with recorded state.
    pub fn tracked_contexts(&self) -> usize {
        self.filter.tracked_contexts()
    }
}

impl Default for SpamFilterLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<Sub> Filter<Sub> for SpamFilterLayer
where
    Sub: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn enabled(&self, _meta: &Metadata<'_>, _cx: &Context<'_, Sub>) -> bool {
        // Decisions need field values, so they happen in event_enabled
        true
    }

    fn event_enabled(&self, event: &tracing::Event<'_>, cx: &Context<'_, Sub>) -> bool {
        if *event.metadata().level() != Level::WARN {
            return true;
        }

        let mut visitor = EventVisitor::new();
        event.record(&mut visitor);
        let args = visitor.args();

        self.filter
            .should_emit_by(&self.rule, visitor.message(), &args, || {
                self.resolve_context(cx)
            })
    }
}

impl<Sub> Layer<Sub> for SpamFilterLayer
where
    Sub: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: Context<'_, Sub>,
    ) {
        if self.context_field.is_none() {
            return;
        }

        let mut visitor = SpanFieldVisitor::new();
        attrs.record(&mut visitor);

        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(visitor.into_fields());
        }
    }
}
