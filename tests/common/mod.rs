//! Helpers shared by integration tests.

#![allow(dead_code)]

use std::io;
use std::time::Instant;
use tracing_spam_filter::infrastructure::mocks::MockClock;

pub const TRANSPORT_FORMAT: &str =
    "grpc: addrConn.resetTransport failed to create client transport: %v; Reconnecting to %v";

pub fn refused() -> io::Error {
    io::Error::new(
        io::ErrorKind::ConnectionRefused,
        "dial tcp 127.0.0.1:26257: connect: connection refused",
    )
}

pub fn mock_clock() -> MockClock {
    MockClock::new(Instant::now())
}
