//! Registry of last-allowed timestamps per execution context.
//!
//! Entries are only written when an event is allowed. Contexts that never
//! trigger a noisy event never occupy space, and entries are never evicted.

use crate::application::ports::{Clock, Storage};
use crate::domain::context::ContextId;
use crate::domain::window::{SuppressionWindow, WindowDecision};
use std::sync::Arc;
use std::time::Instant;

/// Registry managing all suppression state.
///
/// This type is generic over the storage implementation. In production, use
/// `Arc<ShardedStorage>`.
#[derive(Clone)]
pub struct SuppressionRegistry<S>
where
    S: Storage<ContextId, Instant> + Clone,
{
    storage: S,
    clock: Arc<dyn Clock>,
}

impl<S> SuppressionRegistry<S>
where
    S: Storage<ContextId, Instant> + Clone,
{
    /// Create a new registry with storage and clock.
    pub fn new(storage: S, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Evaluate an event from `context` against `window`.
    ///
    /// The current time is read before the entry lock is taken. On `Allow`
    /// the time is recorded as the context's last emission; on `Suppress`
    /// the stored time is left as is.
    pub fn admit(&self, context: ContextId, window: SuppressionWindow) -> WindowDecision {
        let now = self.clock.now();
        let written = self.storage.record_if(context, |last| {
            window
                .evaluate(last.copied(), now)
                .is_allow()
                .then_some(now)
        });

        if written {
            WindowDecision::Allow
        } else {
            WindowDecision::Suppress
        }
    }

    /// Time of the last allowed event for `context`, if any.
    pub fn last_allowed(&self, context: ContextId) -> Option<Instant> {
        self.storage.get(&context)
    }

    /// Get the number of tracked contexts.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Clear all tracked state.
    pub fn clear(&self) {
        self.storage.clear();
    }
}
