//! Test doubles for infrastructure adapters.
//!
//! These give tests control over time, context identity and event capture.

pub mod clock;
pub mod context;
pub mod layer;

pub use clock::MockClock;
pub use context::FixedContext;
pub use layer::{CapturedEvent, MockCaptureLayer};
