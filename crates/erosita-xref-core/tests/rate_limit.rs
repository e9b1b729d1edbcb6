// crates/erosita-xref-core/tests/rate_limit.rs
// ============================================================================
// Module: Rate Limit Timing Tests
// Description: Wall-clock lower bounds for paced runs.
// Purpose: Ensure call pacing holds across a full coordinator run.
// ============================================================================

//! Timing-based rate limit checks.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod support;

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use erosita_xref_core::QueryCoordinator;
use support::RecordingSink;
use support::Reply;
use support::ScriptedClient;

fn assert_close(actual: Duration, expected: Duration) {
    let delta = actual.abs_diff(expected);
    assert!(delta < Duration::from_micros(1), "{actual:?} != {expected:?}");
}

#[test]
fn single_worker_run_respects_call_rate() {
    let rate = 40.0;
    let count = 8_i64;
    let mut descriptor = support::descriptor("NED", 1, 0);
    descriptor.max_call_rate = rate;
    let client = Arc::new(ScriptedClient::new(Reply::Rows(1)));
    let entry = support::entry(descriptor, Arc::clone(&client));
    let sink = Arc::new(RecordingSink::default());
    let sources = support::sources(count);
    let radii = support::radii(&sources);

    let started = Instant::now();
    let summary = QueryCoordinator::new(sink).run(&entry, &sources, &radii, 1, 3).unwrap();
    let elapsed = started.elapsed();

    #[allow(clippy::cast_precision_loss, reason = "Small fixture counts.")]
    let floor = Duration::from_secs_f64((count - 1) as f64 / rate);
    assert_close(summary.call_interval, Duration::from_millis(25));
    assert!(elapsed >= floor.mul_f64(0.95), "elapsed {elapsed:?} below {floor:?}");
}

#[test]
fn pool_interval_scales_with_effective_workers() {
    let mut descriptor = support::descriptor("SIMBAD", 3, 0);
    descriptor.max_call_rate = 100.0;
    let entry = support::entry(descriptor, Arc::new(ScriptedClient::new(Reply::NoMatch)));
    let sources = support::sources(6);
    let radii = support::radii(&sources);

    let summary = QueryCoordinator::new(Arc::new(RecordingSink::default()))
        .run(&entry, &sources, &radii, 8, 2)
        .unwrap();

    assert_eq!(summary.effective_workers, 3);
    assert_close(summary.call_interval, Duration::from_millis(30));
}

#[test]
fn retries_are_paced_like_fresh_calls() {
    let rate = 50.0;
    let mut descriptor = support::descriptor("NED", 1, 4);
    descriptor.max_call_rate = rate;
    let client = Arc::new(ScriptedClient::new(Reply::Rows(1)).script(1, &[Reply::Timeout; 4]));
    let entry = support::entry(descriptor, Arc::clone(&client));
    let sources = support::sources(1);
    let radii = support::radii(&sources);

    let started = Instant::now();
    let summary = QueryCoordinator::new(Arc::new(RecordingSink::default()))
        .run(&entry, &sources, &radii, 1, 1)
        .unwrap();

    assert_eq!(summary.error_count, 0);
    assert_eq!(client.calls_for(1), 5);
    assert!(started.elapsed() >= Duration::from_millis(80).mul_f64(0.95));
}
