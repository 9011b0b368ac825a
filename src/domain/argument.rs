//! Log call arguments.
//!
//! Log adapters receive a heterogeneous argument list. Only error values take
//! part in suppression decisions; everything else is carried along for
//! rendering and skipped during the scan.

use std::error::Error;
use std::fmt;

/// A single argument of a log call.
#[derive(Clone, Copy)]
pub enum LogArg<'a> {
    /// An error value. Its `Display` output is matched against the argument pattern.
    Error(&'a (dyn Error + 'static)),
    /// Any other value.
    Value(&'a dyn fmt::Display),
}

impl<'a> LogArg<'a> {
    /// Wrap an error value.
    pub fn error(err: &'a (dyn Error + 'static)) -> Self {
        LogArg::Error(err)
    }

    /// Wrap a plain value.
    pub fn value(value: &'a dyn fmt::Display) -> Self {
        LogArg::Value(value)
    }

    /// Return the error if this argument is one.
    pub fn as_error(&self) -> Option<&'a (dyn Error + 'static)> {
        match self {
            LogArg::Error(err) => Some(*err),
            LogArg::Value(_) => None,
        }
    }
}

impl fmt::Display for LogArg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogArg::Error(err) => fmt::Display::fmt(err, f),
            LogArg::Value(value) => fmt::Display::fmt(value, f),
        }
    }
}

impl fmt::Debug for LogArg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogArg::Error(err) => f.debug_tuple("Error").field(&err.to_string()).finish(),
            LogArg::Value(value) => f.debug_tuple("Value").field(&value.to_string()).finish(),
        }
    }
}

/// Find the first error among `args`, skipping non-error values.
pub fn first_error<'a>(args: &[LogArg<'a>]) -> Option<&'a (dyn Error + 'static)> {
    args.iter().find_map(LogArg::as_error)
}
