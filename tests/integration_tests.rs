mod common;

use common::{mock_clock, refused, TRANSPORT_FORMAT};
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, warn};
use tracing_spam_filter::{ContextId, LogArg, NoiseRule, SpamFilter, SpamFilterLayer};
use tracing_spam_filter::infrastructure::mocks::{FixedContext, MockCaptureLayer, MockClock};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;

fn filter_with_clock() -> (SpamFilter, MockClock) {
    let clock = mock_clock();
    let filter = SpamFilter::builder()
        .with_clock(Arc::new(clock.clone()))
        .build();
    (filter, clock)
}

#[test]
fn test_scenario_context_42() {
    let (filter, clock) = filter_with_clock();
    let rule = NoiseRule::transport_failure();
    let err = io::Error::new(io::ErrorKind::Other, "dial tcp: connection refused");
    let args = [LogArg::error(&err)];
    let format = "grpc: addrConn.resetTransport failed to create client transport: ";
    let ctx = ContextId::new(42);

    assert!(filter.should_emit_in(ctx, &rule, format, &args));

    clock.advance(Duration::from_secs(30));
    assert!(!filter.should_emit_in(ctx, &rule, format, &args));

    clock.advance(Duration::from_secs(31));
    assert!(filter.should_emit_in(ctx, &rule, format, &args));
}

#[test]
fn test_unrelated_format_never_suppressed() {
    let (filter, _clock) = filter_with_clock();
    let rule = NoiseRule::transport_failure();
    let err = refused();
    let ctx = ContextId::new(1);

    // Seed state for the context with a matching event first
    assert!(filter.should_emit_in(ctx, &rule, TRANSPORT_FORMAT, &[LogArg::error(&err)]));

    for _ in 0..10 {
        assert!(filter.should_emit_in(
            ctx,
            &rule,
            "grpc: Server.Serve failed to complete security handshake: %v",
            &[LogArg::error(&err)]
        ));
    }
}

#[test]
fn test_contexts_do_not_share_windows() {
    let (filter, clock) = filter_with_clock();
    let rule = NoiseRule::transport_failure();
    let err = refused();
    let args = [LogArg::error(&err)];
    let (c1, c2) = (ContextId::new(1), ContextId::new(2));

    assert!(filter.should_emit_in(c1, &rule, TRANSPORT_FORMAT, &args));
    assert!(!filter.should_emit_in(c1, &rule, TRANSPORT_FORMAT, &args));

    clock.advance(Duration::from_secs(20));
    assert!(filter.should_emit_in(c2, &rule, TRANSPORT_FORMAT, &args));

    clock.advance(Duration::from_secs(40));
    // c1 reached its window, c2 has not
    assert!(filter.should_emit_in(c1, &rule, TRANSPORT_FORMAT, &args));
    assert!(!filter.should_emit_in(c2, &rule, TRANSPORT_FORMAT, &args));
}

#[test]
fn test_error_after_plain_values() {
    let (filter, _clock) = filter_with_clock();
    let rule = NoiseRule::transport_failure();
    let err = refused();
    let target = "n3.cluster.local:26257";
    let attempt = 4;
    let args = [LogArg::value(&target), LogArg::value(&attempt), LogArg::error(&err)];
    let ctx = ContextId::new(9);

    assert!(filter.should_emit_in(ctx, &rule, TRANSPORT_FORMAT, &args));
    assert!(!filter.should_emit_in(ctx, &rule, TRANSPORT_FORMAT, &args));
}

#[test]
fn test_other_errors_always_emit() {
    let (filter, _clock) = filter_with_clock();
    let rule = NoiseRule::transport_failure();
    let err = io::Error::new(io::ErrorKind::Other, "x509: certificate signed by unknown authority");
    let ctx = ContextId::new(3);

    for _ in 0..10 {
        assert!(filter.should_emit_in(ctx, &rule, TRANSPORT_FORMAT, &[LogArg::error(&err)]));
    }
    assert_eq!(filter.tracked_contexts(), 0);
}

#[test]
fn test_later_matching_error_does_not_count() {
    let (filter, _clock) = filter_with_clock();
    let rule = NoiseRule::transport_failure();
    let tls = io::Error::new(io::ErrorKind::Other, "tls: handshake failure");
    let err = refused();
    let args = [LogArg::error(&tls), LogArg::error(&err)];
    let ctx = ContextId::new(11);

    for _ in 0..3 {
        assert!(filter.should_emit_in(ctx, &rule, TRANSPORT_FORMAT, &args));
    }
    assert_eq!(filter.metrics().events_unmatched(), 3);
    assert_eq!(filter.tracked_contexts(), 0);
}

#[test]
fn test_context_source_switches_on_one_thread() {
    let clock = mock_clock();
    let contexts = FixedContext::new(ContextId::new(1));
    let filter = SpamFilter::builder()
        .with_clock(Arc::new(clock.clone()))
        .with_context_source(Arc::new(contexts.clone()))
        .build();
    let rule = NoiseRule::transport_failure();
    let err = refused();
    let args = [LogArg::error(&err)];

    assert!(filter.should_emit(&rule, TRANSPORT_FORMAT, &args));
    assert!(!filter.should_emit(&rule, TRANSPORT_FORMAT, &args));

    contexts.set(ContextId::new(2));
    assert!(filter.should_emit(&rule, TRANSPORT_FORMAT, &args));

    contexts.set(ContextId::new(1));
    assert!(!filter.should_emit(&rule, TRANSPORT_FORMAT, &args));
    clock.advance(Duration::from_secs(60));
    assert!(filter.should_emit(&rule, TRANSPORT_FORMAT, &args));

    assert_eq!(filter.tracked_contexts(), 2);
    assert_eq!(filter.current_context(), ContextId::new(1));
}

#[test]
fn test_layer_suppresses_per_thread() {
    let capture = MockCaptureLayer::new();
    let layer = SpamFilterLayer::new();
    let subscriber =
        tracing_subscriber::registry().with(capture.clone().with_filter(layer.clone()));
    let dispatch = tracing::Dispatch::new(subscriber);

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let dispatch = dispatch.clone();
            thread::spawn(move || {
                tracing::dispatcher::with_default(&dispatch, || {
                    let err = refused();
                    for _ in 0..10 {
                        warn!(
                            error = &err as &(dyn std::error::Error + 'static),
                            "grpc: addrConn.resetTransport failed to create client transport: {}",
                            err
                        );
                    }
                });
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(capture.count(), 3);
    assert_eq!(layer.tracked_contexts(), 3);
    assert_eq!(layer.metrics().events_suppressed(), 27);
}

#[test]
fn test_layer_ignores_errors_without_error_field() {
    let capture = MockCaptureLayer::new();
    let layer = SpamFilterLayer::new();
    let subscriber = tracing_subscriber::registry().with(capture.clone().with_filter(layer));

    tracing::subscriber::with_default(subscriber, || {
        let err = refused();
        for _ in 0..4 {
            // Debug-formatted errors are plain values, not error arguments
            warn!(
                error = ?err,
                "grpc: addrConn.resetTransport failed to create client transport: retrying"
            );
        }
        for _ in 0..2 {
            error!(
                error = &err as &(dyn std::error::Error + 'static),
                "grpc: addrConn.resetTransport failed to create client transport: fatal"
            );
        }
    });

    assert_eq!(capture.count(), 6);
}

#[test]
fn test_layer_window_reopens() {
    let capture = MockCaptureLayer::new();
    let clock = mock_clock();
    let layer = SpamFilterLayer::builder()
        .with_rule(NoiseRule::transport_failure().with_window(Duration::from_secs(10)))
        .with_clock(Arc::new(clock.clone()))
        .build()
        .unwrap();
    let subscriber = tracing_subscriber::registry().with(capture.clone().with_filter(layer));

    tracing::subscriber::with_default(subscriber, || {
        let err = io::Error::new(io::ErrorKind::Other, "lookup n5: no such host");
        for _ in 0..3 {
            for _ in 0..5 {
                warn!(
                    error = &err as &(dyn std::error::Error + 'static),
                    "grpc: addrConn.resetTransport failed to create client transport: lookup"
                );
            }
            clock.advance(Duration::from_secs(10));
        }
    });

    assert_eq!(capture.count(), 3);
}
