//! Infrastructure layer - external adapters and integrations.
//!
//! - Clock (system time)
//! - Context source (OS threads)
//! - Storage (sharded map)
//! - Tracing integration (`Filter`/`Layer`) and the severity bridge

pub mod bridge;
pub mod clock;
pub mod context;
pub mod layer;
pub mod storage;
pub(crate) mod visitor;

/// Mock implementations for testing.
///
/// Only available with the `test-helpers` feature or in test builds:
/// ```toml
/// [dev-dependencies]
/// tracing-spam-filter = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
