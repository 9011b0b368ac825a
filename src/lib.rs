//! # tracing-spam-filter
//!
//! Per-context suppression of known-noisy warnings for the `tracing` ecosystem.
//!
//! Some failures are expected and loud. A client that keeps trying to reach a
//! node that is down logs the same transport reset warning on every attempt.
//! This crate lets such a warning through once per window for each execution
//! context and drops the repeats. Everything else passes untouched.
//!
//! An event is subject to suppression when both hold:
//! - its format string matches the rule's format pattern, and
//! - the first error among its arguments has a message matching the rule's
//!   argument pattern.
//!
//! The built-in rule, [`NoiseRule::transport_failure`], matches
//! `grpc: addrConn.resetTransport failed to create client transport:` with a
//! `connection refused`, Windows "actively refused" or `no such host` error,
//! and allows one emission per minute per context.
//!
//! ## Deciding directly
//!
//! ```rust
//! use tracing_spam_filter::{ContextId, LogArg, NoiseRule, SpamFilter};
//! use std::io;
//!
//! let filter = SpamFilter::new();
//! let rule = NoiseRule::transport_failure();
//! let err = io::Error::new(io::ErrorKind::ConnectionRefused, "dial tcp: connection refused");
//! let format = "grpc: addrConn.resetTransport failed to create client transport: %v";
//!
//! let conn = ContextId::new(7);
//! assert!(filter.should_emit_in(conn, &rule, format, &[LogArg::error(&err)]));
//! assert!(!filter.should_emit_in(conn, &rule, format, &[LogArg::error(&err)]));
//!
//! // Another connection has its own window.
//! assert!(filter.should_emit_in(ContextId::new(8), &rule, format, &[LogArg::error(&err)]));
//! ```
//!
//! ## As a tracing filter
//!
//! ```rust,no_run
//! use tracing_spam_filter::SpamFilterLayer;
//! use tracing_subscriber::prelude::*;
//!
//! let spam = SpamFilterLayer::new();
//!
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer().with_filter(spam))
//!     .init();
//! ```
//!
//! Only `WARN` events are inspected. The error must be recorded as an error
//! value (`error = &err as &dyn std::error::Error`) to take part in matching.
//!
//! ## Execution contexts
//!
//! Suppression state is keyed by [`ContextId`]. By default the calling OS
//! thread is the context. Prefer an explicit identity when one is at hand:
//! pass it to [`SpamFilter::should_emit_in`], or name a span field with
//! [`SpamFilterLayerBuilder::with_context_field`].
//!
//! Entries are created only when a matching event is allowed and are never
//! evicted, so memory grows with the number of distinct contexts that ever
//! hit the rule.

// Domain layer - pure types
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

pub use domain::{
    argument::LogArg,
    context::ContextId,
    rule::{NoiseRule, RuleError, CONNECTION_REFUSED_MESSAGES, DEFAULT_WINDOW, TRANSPORT_FAILURE_PREFIX},
    window::{SuppressionWindow, WindowDecision},
};

pub use application::{
    filter::{DefaultStorage, SpamFilter, SpamFilterBuilder},
    metrics::{Metrics, MetricsSnapshot},
    ports::{Clock, ContextSource, Storage},
    registry::SuppressionRegistry,
};

pub use infrastructure::{
    bridge::{render, LogBridge, Severity, BRIDGE_TARGET},
    clock::SystemClock,
    context::ThreadContext,
    layer::{BuildError, SpamFilterLayer, SpamFilterLayerBuilder},
    storage::ShardedStorage,
};
