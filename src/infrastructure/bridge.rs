//! Severity bridge from printf-style library logging into `tracing`.
//!
//! Networking libraries often log through a small interface of
//! `info`/`warning`/`error`/`fatal` calls taking a format string and an
//! argument list. `LogBridge` takes those calls as one function keyed by
//! [`Severity`], runs warnings through the spam filter, and emits what
//! survives as `tracing` events under the `grpc` target.

use crate::application::filter::{DefaultStorage, SpamFilter};
use crate::domain::{argument::LogArg, rule::NoiseRule};
use std::fmt::{self, Write as _};
use std::sync::Arc;

/// Target used for bridged events.
pub const BRIDGE_TARGET: &str = "grpc";

/// Severity of a bridged log call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Informational, logged at `INFO`.
    Info,
    /// Logged at `WARN` and subject to the noise rule.
    Warning,
    /// Logged at `ERROR`.
    Error,
    /// Logged at `ERROR` with `fatal = true`. The bridge never exits the
    /// process; callers that need to abort do so after logging.
    Fatal,
}

impl Severity {
    /// Lower-case name of the severity.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
enum Sink {
    Discard,
    Forward {
        filter: SpamFilter<DefaultStorage>,
        rule: Arc<NoiseRule>,
    },
}

/// Forwards severity-tagged log calls into `tracing`.
///
/// # Example
/// ```
/// use tracing_spam_filter::{LogArg, LogBridge, Severity, SpamFilter};
/// use std::io;
///
/// let bridge = LogBridge::new(SpamFilter::new());
/// let err = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
/// let format = "grpc: addrConn.resetTransport failed to create client transport: %v";
///
/// assert!(bridge.log(Severity::Warning, format, &[LogArg::error(&err)]));
/// // Same thread, inside the window: dropped.
/// assert!(!bridge.log(Severity::Warning, format, &[LogArg::error(&err)]));
/// ```
#[derive(Clone)]
pub struct LogBridge {
    sink: Sink,
}

impl LogBridge {
    /// Bridge that filters warnings with the transport-failure rule.
    pub fn new(filter: SpamFilter<DefaultStorage>) -> Self {
        Self::with_rule(filter, NoiseRule::transport_failure())
    }

    /// Bridge that filters warnings with a custom rule.
    pub fn with_rule(filter: SpamFilter<DefaultStorage>, rule: NoiseRule) -> Self {
        Self {
            sink: Sink::Forward {
                filter,
                rule: Arc::new(rule),
            },
        }
    }

    /// Bridge that drops every call. Useful as the installed default until
    /// library logging is explicitly enabled.
    pub fn discard() -> Self {
        Self {
            sink: Sink::Discard,
        }
    }

    /// Check if calls are forwarded at all.
    pub fn is_enabled(&self) -> bool {
        matches!(self.sink, Sink::Forward { .. })
    }

    /// Whether verbose logging at `level` is on. Always true; level
    /// filtering is left to the subscriber.
    pub fn verbosity_enabled(&self, _level: i32) -> bool {
        true
    }

    /// The spam filter, if forwarding.
    pub fn filter(&self) -> Option<&SpamFilter<DefaultStorage>> {
        match &self.sink {
            Sink::Discard => None,
            Sink::Forward { filter, .. } => Some(filter),
        }
    }

    /// Log a call at `severity`.
    ///
    /// Returns `true` if an event was emitted. Warnings matching the noise
    /// rule are dropped while their context is inside the window.
    pub fn log(&self, severity: Severity, format: &str, args: &[LogArg<'_>]) -> bool {
        let (filter, rule) = match &self.sink {
            Sink::Discard => return false,
            Sink::Forward { filter, rule } => (filter, rule),
        };

        if severity == Severity::Warning && !filter.should_emit(rule, format, args) {
            return false;
        }

        let message = render(format, args);
        match severity {
            Severity::Info => tracing::info!(target: BRIDGE_TARGET, "{}", message),
            Severity::Warning => tracing::warn!(target: BRIDGE_TARGET, "{}", message),
            Severity::Error => tracing::error!(target: BRIDGE_TARGET, "{}", message),
            Severity::Fatal => tracing::error!(target: BRIDGE_TARGET, fatal = true, "{}", message),
        }
        true
    }

    /// Log at [`Severity::Info`].
    pub fn info(&self, format: &str, args: &[LogArg<'_>]) -> bool {
        self.log(Severity::Info, format, args)
    }

    /// Log at [`Severity::Warning`], dropping repeats the rule matches.
    pub fn warning(&self, format: &str, args: &[LogArg<'_>]) -> bool {
        self.log(Severity::Warning, format, args)
    }

    /// Log at [`Severity::Error`].
    pub fn error(&self, format: &str, args: &[LogArg<'_>]) -> bool {
        self.log(Severity::Error, format, args)
    }

    /// Log at [`Severity::Fatal`]. Does not exit the process.
    pub fn fatal(&self, format: &str, args: &[LogArg<'_>]) -> bool {
        self.log(Severity::Fatal, format, args)
    }
}

impl Default for LogBridge {
    fn default() -> Self {
        Self::discard()
    }
}

impl fmt::Debug for LogBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogBridge")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Render a printf-style format with its arguments.
///
/// Every `%` directive consumes the next argument and prints it with
/// `Display`. A directive may carry flags (`+-# 0`), a width and a precision
/// before its verb, as in `%+v`, `%-10s` or `%.2f`. Width pads the rendered
/// argument (`-` left-aligns, `0` pads with zeros); precision applies to
/// `%f` arguments that render as a number. `%q` quotes the argument. `%%`
/// is a literal percent.
/// Arguments left over are appended separated by spaces, so an empty format
/// joins all arguments. A verb with no argument left is printed as
/// `%!v(MISSING)`.
pub fn render(format: &str, args: &[LogArg<'_>]) -> String {
    let mut out = String::with_capacity(format.len() + 16 * args.len());
    let mut remaining = args.iter();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }

        let mut directive = Directive::default();
        while let Some(&next) = chars.peek() {
            if !directive.accept(next) {
                break;
            }
            chars.next();
        }

        match chars.next() {
            Some(verb) => match remaining.next() {
                Some(arg) => directive.write(&mut out, verb, arg),
                None => {
                    let _ = write!(out, "%!{}(MISSING)", verb);
                }
            },
            None => {
                out.push('%');
                out.push_str(&directive.raw);
            }
        }
    }

    for arg in remaining {
        if !out.is_empty() {
            out.push(' ');
        }
        let _ = write!(out, "{}", arg);
    }
    out
}

/// Flags, width and precision between a `%` and its verb.
#[derive(Debug, Default)]
struct Directive {
    raw: String,
    left: bool,
    zero: bool,
    width: Option<usize>,
    precision: Option<usize>,
    in_precision: bool,
}

impl Directive {
    /// Consume one character of the directive. Returns false at the verb.
    fn accept(&mut self, c: char) -> bool {
        match c {
            '.' if !self.in_precision => {
                self.in_precision = true;
                self.precision = Some(0);
            }
            '0'..='9' => {
                let digit = c as usize - '0' as usize;
                if self.in_precision {
                    self.precision = Some(self.precision.unwrap_or(0) * 10 + digit);
                } else if c == '0' && self.width.is_none() {
                    self.zero = true;
                } else {
                    self.width = Some(self.width.unwrap_or(0) * 10 + digit);
                }
            }
            '-' if !self.in_precision && self.width.is_none() => self.left = true,
            '+' | '#' | ' ' if !self.in_precision && self.width.is_none() => {}
            _ => return false,
        }
        self.raw.push(c);
        true
    }

    fn write(&self, out: &mut String, verb: char, arg: &LogArg<'_>) {
        let mut text = arg.to_string();
        match (verb, self.precision) {
            ('q', _) => text = format!("{:?}", text),
            ('f' | 'F', Some(precision)) => {
                if let Ok(number) = text.parse::<f64>() {
                    text = format!("{:.*}", precision, number);
                }
            }
            _ => {}
        }

        let width = self.width.unwrap_or(0);
        let len = text.chars().count();
        if len >= width {
            out.push_str(&text);
            return;
        }

        let fill = width - len;
        if self.left {
            out.push_str(&text);
            out.extend(std::iter::repeat(' ').take(fill));
        } else if self.zero {
            let (sign, digits) = match text.strip_prefix('-') {
                Some(rest) => ("-", rest),
                None => ("", text.as_str()),
            };
            out.push_str(sign);
            out.extend(std::iter::repeat('0').take(fill));
            out.push_str(digits);
        } else {
            out.extend(std::iter::repeat(' ').take(fill));
            out.push_str(&text);
        }
    }
}
