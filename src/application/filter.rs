//! Spam filter decision logic.
//!
//! The filter decides whether a log event should be emitted. Events matching
//! a noise rule are rate limited per execution context; everything else is
//! always emitted.

use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, ContextSource, Storage};
use crate::application::registry::SuppressionRegistry;
use crate::domain::{
    argument::LogArg,
    context::ContextId,
    rule::{matches_event, NoiseRule},
    window::{SuppressionWindow, WindowDecision},
};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::context::ThreadContext;
use crate::infrastructure::storage::ShardedStorage;
use regex::Regex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default storage backend for suppression state.
pub type DefaultStorage = Arc<ShardedStorage<ContextId, Instant>>;

/// Per-context rate limiter for known-noisy log events.
///
/// Clones share suppression state, metrics and the context source. Construct
/// one instance at startup and hand clones to every call site; separate
/// instances have separate state.
///
/// # Example
/// ```
/// use tracing_spam_filter::{ContextId, LogArg, NoiseRule, SpamFilter};
/// use std::io;
///
/// let filter = SpamFilter::new();
/// let rule = NoiseRule::transport_failure();
/// let err = io::Error::new(io::ErrorKind::ConnectionRefused, "dial tcp: connection refused");
/// let format = "grpc: addrConn.resetTransport failed to create client transport: %v";
/// let ctx = ContextId::new(42);
///
/// assert!(filter.should_emit_in(ctx, &rule, format, &[LogArg::error(&err)]));
/// assert!(!filter.should_emit_in(ctx, &rule, format, &[LogArg::error(&err)]));
///
/// // Unrelated events always pass.
/// assert!(filter.should_emit_in(ctx, &rule, "something else", &[]));
/// ```
#[derive(Clone)]
pub struct SpamFilter<S = DefaultStorage>
where
    S: Storage<ContextId, Instant> + Clone,
{
    registry: SuppressionRegistry<S>,
    contexts: Arc<dyn ContextSource>,
    metrics: Metrics,
}

impl<S> SpamFilter<S>
where
    S: Storage<ContextId, Instant> + Clone,
{
    /// Create a filter over a custom storage backend.
    pub fn with_parts(
        registry: SuppressionRegistry<S>,
        contexts: Arc<dyn ContextSource>,
        metrics: Metrics,
    ) -> Self {
        Self {
            registry,
            contexts,
            metrics,
        }
    }

    /// Decide whether an event should be emitted, using explicit patterns
    /// and window. The context is taken from the configured source.
    ///
    /// Returns `true` unless `format` matches `format_pattern`, the first
    /// error in `args` matches `arg_pattern`, and the calling context already
    /// emitted such an event less than `window` ago.
    pub fn should_emit_with(
        &self,
        format_pattern: &Regex,
        arg_pattern: &Regex,
        window: Duration,
        format: &str,
        args: &[LogArg<'_>],
    ) -> bool {
        if !matches_event(format_pattern, arg_pattern, format, args) {
            self.metrics.record_unmatched();
            return true;
        }
        let context = self.contexts.current();
        self.admit(context, SuppressionWindow::new(window))
    }

    /// Decide whether an event should be emitted under `rule`, keyed by the
    /// current context from the configured source.
    pub fn should_emit(&self, rule: &NoiseRule, format: &str, args: &[LogArg<'_>]) -> bool {
        self.should_emit_by(rule, format, args, || self.contexts.current())
    }

    /// Decide whether an event should be emitted under `rule` for an
    /// explicitly identified context.
    pub fn should_emit_in(
        &self,
        context: ContextId,
        rule: &NoiseRule,
        format: &str,
        args: &[LogArg<'_>],
    ) -> bool {
        self.should_emit_by(rule, format, args, || context)
    }

    /// Decide whether an event should be emitted under `rule`, resolving the
    /// context lazily. `context` is only called for events the rule matches.
    pub fn should_emit_by<F>(
        &self,
        rule: &NoiseRule,
        format: &str,
        args: &[LogArg<'_>],
        context: F,
    ) -> bool
    where
        F: FnOnce() -> ContextId,
    {
        if !rule.matches(format, args) {
            self.metrics.record_unmatched();
            return true;
        }
        self.admit(context(), rule.window())
    }

    fn admit(&self, context: ContextId, window: SuppressionWindow) -> bool {
        match self.registry.admit(context, window) {
            WindowDecision::Allow => {
                self.metrics.record_allowed();
                true
            }
            WindowDecision::Suppress => {
                self.metrics.record_suppressed();
                false
            }
        }
    }

    /// Get a reference to the registry.
    pub fn registry(&self) -> &SuppressionRegistry<S> {
        &self.registry
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Identifier of the current context according to the configured source.
    pub fn current_context(&self) -> ContextId {
        self.contexts.current()
    }

    /// Number of contexts with recorded state.
    pub fn tracked_contexts(&self) -> usize {
        self.registry.len()
    }
}

impl SpamFilter<DefaultStorage> {
    /// Create a builder for configuring the filter.
    ///
    /// Defaults:
    /// - Clock: `SystemClock`
    /// - Context source: `ThreadContext`
    pub fn builder() -> SpamFilterBuilder {
        SpamFilterBuilder {
            clock: None,
            contexts: None,
            metrics: None,
        }
    }

    /// Create a filter with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }
}

impl Default for SpamFilter<DefaultStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> std::fmt::Debug for SpamFilter<S>
where
    S: Storage<ContextId, Instant> + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpamFilter")
            .field("tracked_contexts", &self.registry.len())
            .field("contexts", &self.contexts)
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

/// Builder for constructing a `SpamFilter`.
pub struct SpamFilterBuilder {
    clock: Option<Arc<dyn Clock>>,
    contexts: Option<Arc<dyn ContextSource>>,
    metrics: Option<Metrics>,
}

impl SpamFilterBuilder {
    /// Set a custom clock (mainly for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the source of execution context identifiers.
    pub fn with_context_source(mut self, contexts: Arc<dyn ContextSource>) -> Self {
        self.contexts = Some(contexts);
        self
    }

    /// Share an existing metrics tracker.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the filter.
    pub fn build(self) -> SpamFilter<DefaultStorage> {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));
        let contexts = self
            .contexts
            .unwrap_or_else(|| Arc::new(ThreadContext::new()));
        let registry = SuppressionRegistry::new(Arc::new(ShardedStorage::new()), clock);

        SpamFilter::with_parts(registry, contexts, self.metrics.unwrap_or_default())
    }
}
