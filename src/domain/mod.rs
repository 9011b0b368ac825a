//! Domain layer - pure types with no I/O.
//!
//! - Execution context identity
//! - Log call arguments
//! - Noise rules (pattern pair + window)
//! - The suppression window decision

pub mod argument;
pub mod context;
pub mod rule;
pub mod window;
