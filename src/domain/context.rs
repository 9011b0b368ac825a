//! Execution context identity.
//!
//! A `ContextId` names the logical unit that issued a log call: a thread, a
//! connection, a request. Suppression state is partitioned by this key, so two
//! contexts hitting the same noisy failure are rate limited independently.

use ahash::AHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier of the calling execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    /// Create a context id from a raw value.
    pub const fn new(raw: u64) -> Self {
        ContextId(raw)
    }

    /// Derive a context id from an arbitrary key, such as a connection id
    /// carried in a span field.
    ///
    /// Equal keys always map to the same id within a process.
    pub fn from_key(key: &str) -> Self {
        let mut hasher = AHasher::default();
        key.hash(&mut hasher);
        ContextId(hasher.finish())
    }

    /// Get the raw value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ContextId {
    fn from(raw: u64) -> Self {
        ContextId(raw)
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}
