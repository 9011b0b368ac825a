//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use crate::domain::context::ContextId;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Instant;

/// Port for obtaining current time.
///
/// Infrastructure provides concrete implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// Port for identifying the calling execution context.
///
/// Infrastructure provides `ThreadContext`, which identifies OS threads.
/// Callers that carry their own identity (connection or request ids) can pass
/// a `ContextId` explicitly instead.
pub trait ContextSource: Send + Sync + Debug {
    /// Identifier of the context making the current call.
    fn current(&self) -> ContextId;
}

/// Port for concurrent key-value storage of suppression state.
///
/// Infrastructure provides concrete implementations (ShardedStorage).
pub trait Storage<K, V>: Send + Sync + Debug
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    /// Atomically decide whether to write a new value for `key`.
    ///
    /// `decide` receives the current value (or `None`) while the entry is
    /// locked. If it returns `Some`, that value is stored. No entry is created
    /// when it returns `None`.
    ///
    /// # Returns
    /// `true` if a value was written.
    fn record_if<F>(&self, key: K, decide: F) -> bool
    where
        F: FnOnce(Option<&V>) -> Option<V>;

    /// Get a copy of the value stored for `key`.
    fn get(&self, key: &K) -> Option<V>
    where
        V: Clone;

    /// Get the number of entries in the storage.
    fn len(&self) -> usize;

    /// Check if the storage is empty.
    fn is_empty(&self) -> bool;

    /// Clear all entries from the storage.
    fn clear(&self);
}
