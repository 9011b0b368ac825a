//! Observability metrics for spam filtering.
//!
//! Provides counters describing filter decisions for monitoring and debugging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking filter decisions.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Noisy events that were let through
    events_allowed: AtomicU64,
    /// Noisy events dropped inside their window
    events_suppressed: AtomicU64,
    /// Events that did not match the rule and passed untouched
    events_unmatched: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                events_allowed: AtomicU64::new(0),
                events_suppressed: AtomicU64::new(0),
                events_unmatched: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn record_allowed(&self) {
        self.inner.events_allowed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_suppressed(&self) {
        self.inner.events_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unmatched(&self) {
        self.inner.events_unmatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the number of matching events allowed.
    pub fn events_allowed(&self) -> u64 {
        self.inner.events_allowed.load(Ordering::Relaxed)
    }

    /// Get the number of matching events suppressed.
    pub fn events_suppressed(&self) -> u64 {
        self.inner.events_suppressed.load(Ordering::Relaxed)
    }

    /// Get the number of events the rule did not apply to.
    pub fn events_unmatched(&self) -> u64 {
        self.inner.events_unmatched.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_allowed: self.events_allowed(),
            events_suppressed: self.events_suppressed(),
            events_unmatched: self.events_unmatched(),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.inner.events_allowed.store(0, Ordering::Relaxed);
        self.inner.events_suppressed.store(0, Ordering::Relaxed);
        self.inner.events_unmatched.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Noisy events that were let through
    pub events_allowed: u64,
    /// Noisy events dropped inside their window
    pub events_suppressed: u64,
    /// Events that did not match the rule
    pub events_unmatched: u64,
}

impl MetricsSnapshot {
    /// Total number of events evaluated.
    pub fn total_events(&self) -> u64 {
        self.events_allowed
            .saturating_add(self.events_suppressed)
            .saturating_add(self.events_unmatched)
    }

    /// Fraction of matching events that were suppressed (0.0 to 1.0).
    ///
    /// Returns 0.0 if no matching events have been seen.
    pub fn suppression_rate(&self) -> f64 {
        let matched = self.events_allowed.saturating_add(self.events_suppressed);
        if matched == 0 {
            0.0
        } else {
            self.events_suppressed as f64 / matched as f64
        }
    }
}
