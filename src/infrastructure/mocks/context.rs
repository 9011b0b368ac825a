//! Mock context source for testing.

use crate::application::ports::ContextSource;
use crate::domain::context::ContextId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Context source returning a settable id, regardless of the calling thread.
///
/// Lets a single test thread act as several execution contexts.
#[derive(Debug, Clone)]
pub struct FixedContext {
    current: Arc<AtomicU64>,
}

impl FixedContext {
    /// Create a source reporting `id` until changed.
    pub fn new(id: ContextId) -> Self {
        Self {
            current: Arc::new(AtomicU64::new(id.as_u64())),
        }
    }

    /// Switch the reported context.
    pub fn set(&self, id: ContextId) {
        self.current.store(id.as_u64(), Ordering::SeqCst);
    }
}

impl ContextSource for FixedContext {
    fn current(&self) -> ContextId {
        ContextId::new(self.current.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_context() {
        let source = FixedContext::new(ContextId::new(42));
        assert_eq!(source.current(), ContextId::new(42));

        source.clone().set(ContextId::new(7));
        assert_eq!(source.current(), ContextId::new(7));
    }
}
