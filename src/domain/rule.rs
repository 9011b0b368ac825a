//! Noise rules: which log events are subject to suppression.
//!
//! A rule pairs a pattern on the log format string with a pattern on the
//! message of the first error argument, plus the suppression window applied
//! when both match.

use crate::domain::argument::{first_error, LogArg};
use crate::domain::window::SuppressionWindow;
use regex::Regex;
use std::fmt;
use std::time::Duration;

/// Default suppression window: one emission per minute per context.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Format prefix logged when a client connection fails to rebuild its transport.
pub const TRANSPORT_FAILURE_PREFIX: &str =
    "grpc: addrConn.resetTransport failed to create client transport:";

/// Error texts meaning the remote end is simply not there.
pub const CONNECTION_REFUSED_MESSAGES: [&str; 3] = [
    // *nix
    "connection refused",
    // Windows
    "No connection could be made because the target machine actively refused it",
    // host removed from the network and no longer resolvable
    "no such host",
];

/// Error returned when a noise rule cannot be constructed.
#[derive(Debug, Clone)]
pub enum RuleError {
    /// One of the patterns is not a valid regular expression
    InvalidPattern {
        /// Which pattern failed ("format" or "argument")
        which: &'static str,
        /// The underlying regex error
        source: regex::Error,
    },
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::InvalidPattern { which, source } => {
                write!(f, "invalid {} pattern: {}", which, source)
            }
        }
    }
}

impl std::error::Error for RuleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuleError::InvalidPattern { source, .. } => Some(source),
        }
    }
}

/// A pattern pair and the window applied to events matching both.
#[derive(Debug, Clone)]
pub struct NoiseRule {
    format_pattern: Regex,
    arg_pattern: Regex,
    window: SuppressionWindow,
}

impl NoiseRule {
    /// Build a rule from regular expression sources.
    ///
    /// # Errors
    /// Returns `RuleError::InvalidPattern` if either expression fails to compile.
    pub fn new(format_pattern: &str, arg_pattern: &str, window: Duration) -> Result<Self, RuleError> {
        let format_pattern = Regex::new(format_pattern).map_err(|source| {
            RuleError::InvalidPattern {
                which: "format",
                source,
            }
        })?;
        let arg_pattern = Regex::new(arg_pattern).map_err(|source| RuleError::InvalidPattern {
            which: "argument",
            source,
        })?;
        Ok(Self::from_regexes(format_pattern, arg_pattern, window))
    }

    /// Build a rule from already compiled expressions.
    pub fn from_regexes(format_pattern: Regex, arg_pattern: Regex, window: Duration) -> Self {
        Self {
            format_pattern,
            arg_pattern,
            window: SuppressionWindow::new(window),
        }
    }

    /// Build a rule matching a literal format prefix and any of the literal
    /// error substrings. Literals are escaped, so regex metacharacters in them
    /// have no special meaning.
    ///
    /// # Errors
    /// Returns `RuleError::InvalidPattern` only if the escaped input exceeds
    /// regex size limits.
    pub fn literal<I, T>(format_prefix: &str, error_texts: I, window: Duration) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let format_pattern = format!("^{}", regex::escape(format_prefix));
        let arg_pattern = error_texts
            .into_iter()
            .map(|text| regex::escape(text.as_ref()))
            .collect::<Vec<_>>()
            .join("|");
        Self::new(&format_pattern, &arg_pattern, window)
    }

    /// The rule for failed client transport resets caused by refused
    /// connections or unresolvable hosts, with a one minute window.
    pub fn transport_failure() -> Self {
        Self::literal(
            TRANSPORT_FAILURE_PREFIX,
            CONNECTION_REFUSED_MESSAGES,
            DEFAULT_WINDOW,
        )
        .expect("escaped literal patterns always compile")
    }

    /// Replace the window, keeping the patterns.
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = SuppressionWindow::new(window);
        self
    }

    /// Pattern applied to the format string.
    pub fn format_pattern(&self) -> &Regex {
        &self.format_pattern
    }

    /// Pattern applied to the first error argument's message.
    pub fn arg_pattern(&self) -> &Regex {
        &self.arg_pattern
    }

    /// Suppression window for matching events.
    pub fn window(&self) -> SuppressionWindow {
        self.window
    }

    /// Check whether an event falls under this rule.
    ///
    /// The format must match, and the first error argument (if any) must
    /// match the argument pattern. Later error arguments are not inspected:
    /// an event whose first error is unrelated is unmatched even when a
    /// later error would match. gRPC's own Go logger keeps scanning until
    /// an error matches, so `[tls_err, refused_err]` is rate limited there
    /// and always emitted here.
    pub fn matches(&self, format: &str, args: &[LogArg<'_>]) -> bool {
        matches_event(&self.format_pattern, &self.arg_pattern, format, args)
    }
}

impl Default for NoiseRule {
    fn default() -> Self {
        Self::transport_failure()
    }
}

/// Pure matching step shared by rule-based and ad-hoc checks.
pub(crate) fn matches_event(
    format_pattern: &Regex,
    arg_pattern: &Regex,
    format: &str,
    args: &[LogArg<'_>],
) -> bool {
    if !format_pattern.is_match(format) {
        return false;
    }
    match first_error(args) {
        Some(err) => arg_pattern.is_match(&err.to_string()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn err(msg: &str) -> io::Error {
        io::Error::new(io::ErrorKind::Other, msg.to_string())
    }

    #[test]
    fn test_transport_failure_format_is_anchored() {
        let rule = NoiseRule::transport_failure();
        let e = err("dial tcp 10.0.0.1:26257: connect: connection refused");
        let args = [LogArg::error(&e)];

        assert!(rule.matches(
            "grpc: addrConn.resetTransport failed to create client transport: %v; Reconnecting to %v",
            &args
        ));
        assert!(!rule.matches(
            "warning: grpc: addrConn.resetTransport failed to create client transport:",
            &args
        ));
    }

    #[test]
    fn test_transport_failure_error_texts() {
        let rule = NoiseRule::transport_failure();
        let format = TRANSPORT_FAILURE_PREFIX;

        for msg in [
            "dial tcp: connection refused",
            "connectex: No connection could be made because the target machine actively refused it.",
            "dial tcp: lookup node3: no such host",
        ] {
            let e = err(msg);
            assert!(rule.matches(format, &[LogArg::error(&e)]), "{}", msg);
        }

        let e = err("i/o timeout");
        assert!(!rule.matches(format, &[LogArg::error(&e)]));
    }

    #[test]
    fn test_literal_escapes_metacharacters() {
        let rule = NoiseRule::literal("a.b(", ["x+y"], DEFAULT_WINDOW).unwrap();
        let hit = err("got x+y");
        let miss = err("got xxy");

        assert!(rule.matches("a.b( tail", &[LogArg::error(&hit)]));
        assert!(!rule.matches("aXb( tail", &[LogArg::error(&hit)]));
        assert!(!rule.matches("a.b(", &[LogArg::error(&miss)]));
    }

    #[test]
    fn test_only_first_error_is_inspected() {
        let rule = NoiseRule::transport_failure();
        let benign = err("connection refused");
        let other = err("tls: bad certificate");

        assert!(!rule.matches(TRANSPORT_FAILURE_PREFIX, &[LogArg::error(&other), LogArg::error(&benign)]));
        assert!(rule.matches(TRANSPORT_FAILURE_PREFIX, &[LogArg::error(&benign), LogArg::error(&other)]));
    }

    #[test]
    fn test_no_error_argument() {
        let rule = NoiseRule::transport_failure();
        let text = "connection refused";
        assert!(!rule.matches(TRANSPORT_FAILURE_PREFIX, &[LogArg::value(&text)]));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = NoiseRule::new("(", "ok", DEFAULT_WINDOW);
        match result {
            Err(RuleError::InvalidPattern { which, .. }) => assert_eq!(which, "format"),
            Ok(_) => panic!("expected invalid pattern"),
        }

        let result = NoiseRule::new("ok", "[", DEFAULT_WINDOW);
        assert!(matches!(
            result,
            Err(RuleError::InvalidPattern { which: "argument", .. })
        ));
    }

    #[test]
    fn test_with_window() {
        let rule = NoiseRule::transport_failure().with_window(Duration::from_secs(5));
        assert_eq!(rule.window().duration(), Duration::from_secs(5));
        assert_eq!(NoiseRule::default().window().duration(), DEFAULT_WINDOW);
    }
}
