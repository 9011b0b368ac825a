//! Suppression window policy.
//!
//! A window admits an event when no earlier event was admitted for the same
//! context, or when at least the window duration has elapsed since the last
//! admitted one.

use std::time::{Duration, Instant};

/// Outcome of evaluating an event against a suppression window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDecision {
    /// Emit the event and record the current time
    Allow,
    /// Drop the event, leaving recorded state untouched
    Suppress,
}

impl WindowDecision {
    /// Check if the decision is to allow.
    pub fn is_allow(&self) -> bool {
        matches!(self, WindowDecision::Allow)
    }

    /// Check if the decision is to suppress.
    pub fn is_suppress(&self) -> bool {
        matches!(self, WindowDecision::Suppress)
    }
}

/// Minimum interval between two admitted events of one context.
///
/// # Example
/// ```
/// use tracing_spam_filter::SuppressionWindow;
/// use std::time::{Duration, Instant};
///
/// let window = SuppressionWindow::new(Duration::from_secs(60));
/// let t0 = Instant::now();
///
/// assert!(window.evaluate(None, t0).is_allow());
/// assert!(window.evaluate(Some(t0), t0 + Duration::from_secs(30)).is_suppress());
/// assert!(window.evaluate(Some(t0), t0 + Duration::from_secs(60)).is_allow());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppressionWindow {
    duration: Duration,
}

impl SuppressionWindow {
    /// Create a window of the given length.
    ///
    /// A zero-length window admits every event.
    pub const fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// Length of the window.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Decide whether an event at `now` is admitted given the time of the last
    /// admitted event, if any.
    ///
    /// A clock that moved backwards counts as zero elapsed time.
    pub fn evaluate(&self, last_allowed: Option<Instant>, now: Instant) -> WindowDecision {
        match last_allowed {
            Some(last) if now.saturating_duration_since(last) < self.duration => {
                WindowDecision::Suppress
            }
            _ => WindowDecision::Allow,
        }
    }
}

impl From<Duration> for SuppressionWindow {
    fn from(duration: Duration) -> Self {
        Self::new(duration)
    }
}
