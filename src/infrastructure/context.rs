//! Context source identifying OS threads.
//!
//! The standard library does not expose a numeric thread id on stable, so each
//! thread draws a process-unique number from a global counter the first time
//! it asks. Ids are never reused.

use crate::application::ports::ContextSource;
use crate::domain::context::ContextId;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

/// Identifies the calling context by the current OS thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadContext;

impl ThreadContext {
    /// Create a new thread context source.
    pub fn new() -> Self {
        Self
    }
}

impl ContextSource for ThreadContext {
    fn current(&self) -> ContextId {
        ContextId::new(THREAD_ID.with(|id| *id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_stable_within_thread() {
        let source = ThreadContext::new();
        assert_eq!(source.current(), source.current());
    }

    #[test]
    fn test_distinct_across_threads() {
        let source = ThreadContext::new();
        let here = source.current();
        let there = thread::spawn(move || source.current()).join().unwrap();
        assert_ne!(here, there);
    }
}
