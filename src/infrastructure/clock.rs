//! Clock adapter backed by the monotonic system clock.
//!
//! Tests use `MockClock` (in `crate::infrastructure::mocks`, available with the
//! `test-helpers` feature or in test builds) to step time explicitly.

use crate::application::ports::Clock;
use std::time::Instant;

/// System clock implementation using `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
