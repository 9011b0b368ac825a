//! Application layer - orchestration of domain logic.
//!
//! - Suppression registry (last-allowed time per context)
//! - Spam filter (decision making)
//! - Metrics
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement: time, context identity and storage.

pub mod filter;
pub mod metrics;
pub mod ports;
pub mod registry;
