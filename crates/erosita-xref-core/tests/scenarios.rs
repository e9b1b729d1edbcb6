// crates/erosita-xref-core/tests/scenarios.rs
// ============================================================================
// Module: End-to-End Dispatch Scenarios
// Description: Full session runs over scripted clients and recording sinks.
// Purpose: Validate pre-flight ordering, pooling, and aggregate error counts.
// ============================================================================

//! End-to-end cross-match scenarios.

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
use std::sync::atomic::Ordering;

use erosita_xref_core::Angle;
use erosita_xref_core::DatabaseRegistry;
use erosita_xref_core::ProgressCounter;
use erosita_xref_core::QueryCoordinator;
use erosita_xref_core::XrefError;
use erosita_xref_core::XrefOptions;
use erosita_xref_core::XrefSession;
use support::RecordingSink;
use support::Reply;
use support::ScriptedClient;

fn session_with(
    databases: Vec<(&str, usize, u32, Arc<ScriptedClient>)>,
    sink: &Arc<RecordingSink>,
) -> XrefSession {
    let mut registry = DatabaseRegistry::new();
    for (name, max_threads, retries, client) in databases {
        registry.register(support::entry(support::descriptor(name, max_threads, retries), client)).unwrap();
    }
    XrefSession::new(registry, QueryCoordinator::new(sink.clone()))
}

fn options(group_size: usize, max_workers: usize) -> XrefOptions {
    XrefOptions {
        group_size,
        max_workers,
        overwrite: false,
    }
}

#[test]
fn scenario_a_single_worker_writes_one_row_per_source() {
    let client = Arc::new(ScriptedClient::new(Reply::Rows(1)));
    let sink = Arc::new(RecordingSink::default());
    let session = session_with(vec![("NED", 1, 2, Arc::clone(&client))], &sink);
    let sources = support::sources(5);
    let radii = support::radii(&sources);

    let summary = session.run_database("NED", &sources, &radii, options(5, 4)).unwrap();

    assert_eq!(summary.effective_workers, 1);
    assert_eq!(summary.groups, 1);
    assert_eq!(summary.error_count, 0);
    assert_eq!(sink.rows("NED").len(), 5);
    assert_eq!(sink.source_ids("NED"), vec![1, 2, 3, 4, 5]);
    assert_eq!(sink.appends.load(Ordering::SeqCst), 1);
}

#[test]
fn scenario_b_exhausted_timeouts_count_one_error() {
    let client = Arc::new(ScriptedClient::new(Reply::Rows(1)).script(3, &[Reply::Timeout; 3]));
    let sink = Arc::new(RecordingSink::default());
    let session = session_with(vec![("SIMBAD", 4, 2, Arc::clone(&client))], &sink);
    let sources = support::sources(10);
    let radii = support::radii(&sources);

    let summary = session.run_database("SIMBAD", &sources, &radii, options(5, 2)).unwrap();

    assert_eq!(summary.effective_workers, 2);
    assert_eq!(summary.groups, 2);
    assert_eq!(summary.error_count, 1);
    assert_eq!(summary.failures[0].source_id, 3);
    assert_eq!(client.calls_for(3), 3);
    assert_eq!(sink.rows("SIMBAD").len(), 9);
    assert_eq!(sink.source_ids("SIMBAD"), vec![1, 2, 4, 5, 6, 7, 8, 9, 10]);
}

#[test]
fn scenario_c_unknown_database_fails_before_any_work() {
    let client = Arc::new(ScriptedClient::new(Reply::Rows(1)));
    let sink = Arc::new(RecordingSink::default());
    let session = session_with(vec![("NED", 1, 2, Arc::clone(&client))], &sink);
    let sources = support::sources(3);
    let radii = support::radii(&sources);

    let err = session.run_database("VIZIER", &sources, &radii, options(5, 2)).unwrap_err();

    assert!(matches!(err, XrefError::UnknownDatabase(name) if name == "VIZIER"));
    assert_eq!(client.total_calls(), 0);
    assert_eq!(sink.prepares.load(Ordering::SeqCst), 0);
    assert_eq!(sink.appends.load(Ordering::SeqCst), 0);
}

#[test]
fn shape_mismatch_is_raised_before_the_store_is_prepared() {
    let client = Arc::new(ScriptedClient::new(Reply::Rows(1)));
    let sink = Arc::new(RecordingSink::default());
    let session = session_with(vec![("NED", 1, 2, Arc::clone(&client))], &sink);
    let sources = support::sources(3);
    let radii = vec![Angle::from_arcmin(1.0); 2];

    let err = session.run_database("NED", &sources, &radii, options(5, 2)).unwrap_err();

    assert!(matches!(err, XrefError::ShapeMismatch { sources: 3, radii: 2 }));
    assert_eq!(sink.prepares.load(Ordering::SeqCst), 0);
    assert_eq!(client.total_calls(), 0);
}

#[test]
fn single_radius_is_applied_to_every_source() {
    let client = Arc::new(ScriptedClient::new(Reply::Rows(1)));
    let sink = Arc::new(RecordingSink::default());
    let session = session_with(vec![("NED", 2, 0, Arc::clone(&client))], &sink);
    let sources = support::sources(4);

    let summary =
        session.run_database("NED", &sources, &[Angle::from_arcmin(3.0)], options(2, 2)).unwrap();

    assert_eq!(summary.error_count, 0);
    assert_eq!(sink.rows("NED").len(), 4);
}

#[test]
fn existing_table_requires_overwrite() {
    let client = Arc::new(ScriptedClient::new(Reply::Rows(1)));
    let sink = Arc::new(RecordingSink::default());
    let session = session_with(vec![("NED", 1, 0, Arc::clone(&client))], &sink);
    let sources = support::sources(2);
    let radii = support::radii(&sources);

    session.run_database("NED", &sources, &radii, options(5, 1)).unwrap();
    let calls = client.total_calls();
    let err = session.run_database("NED", &sources, &radii, options(5, 1)).unwrap_err();
    assert!(matches!(err, XrefError::TableExists(table) if table == "XREF_NED"));
    assert_eq!(client.total_calls(), calls);

    let overwrite = XrefOptions {
        overwrite: true,
        ..options(5, 1)
    };
    session.run_database("NED", &sources, &radii, overwrite).unwrap();
    assert_eq!(sink.rows("NED").len(), 2);
}

#[test]
fn store_failures_are_counted_without_aborting_other_groups() {
    let client = Arc::new(ScriptedClient::new(Reply::Rows(1)));
    let sink = Arc::new(RecordingSink::failing(vec![1]));
    let session = session_with(vec![("NED", 3, 0, Arc::clone(&client))], &sink);
    let sources = support::sources(9);
    let radii = support::radii(&sources);

    let summary = session.run_database("NED", &sources, &radii, options(3, 3)).unwrap();

    assert_eq!(summary.groups, 3);
    assert_eq!(summary.error_count, 0);
    assert_eq!(summary.store_failures, 1);
    assert_eq!(summary.lost_rows, 3);
    assert_eq!(summary.rows_written, 6);
    assert_eq!(sink.rows("NED").len(), 6);
}

#[test]
fn progress_reaches_total_incrementally() {
    let client = Arc::new(ScriptedClient::new(Reply::Rows(1)));
    let sink = Arc::new(RecordingSink::default());
    let mut registry = DatabaseRegistry::new();
    registry.register(support::entry(support::descriptor("NED", 2, 0), client)).unwrap();
    let progress = Arc::new(ProgressCounter::new());
    let coordinator = QueryCoordinator::new(sink).with_progress(progress.clone());
    let session = XrefSession::new(registry, coordinator);
    let sources = support::sources(7);
    let radii = support::radii(&sources);

    session.run_database("NED", &sources, &radii, options(2, 2)).unwrap();

    assert_eq!(progress.completed(), 7);
    assert_eq!(progress.updates(), 4);
}

#[test]
fn cross_reference_continues_past_unknown_databases() {
    let ned = Arc::new(ScriptedClient::new(Reply::Rows(1)));
    let simbad = Arc::new(ScriptedClient::new(Reply::Rows(2)).script(1, &[Reply::Service]));
    let sink = Arc::new(RecordingSink::default());
    let session = session_with(
        vec![("NED", 2, 0, Arc::clone(&ned)), ("SIMBAD", 2, 0, Arc::clone(&simbad))],
        &sink,
    );
    let sources = support::sources(4);
    let radii = support::radii(&sources);

    let report = session.cross_reference(&["NED", "VIZIER", "SIMBAD"], &sources, &radii, options(2, 4));

    assert_eq!(report.phases.len(), 3);
    assert_eq!(report.aborted_phases(), 1);
    assert!(matches!(report.phases[1].result, Err(XrefError::UnknownDatabase(_))));
    assert_eq!(report.total_errors(), 1);
    assert_eq!(sink.rows("NED").len(), 4);
    assert_eq!(sink.rows("SIMBAD").len(), 6);
}

#[test]
fn zero_sources_produce_an_empty_run() {
    let client = Arc::new(ScriptedClient::new(Reply::Rows(1)));
    let sink = Arc::new(RecordingSink::default());
    let session = session_with(vec![("NED", 2, 0, Arc::clone(&client))], &sink);

    let summary = session.run_database("NED", &[], &[], options(5, 2)).unwrap();

    assert_eq!(summary.groups, 0);
    assert_eq!(summary.error_count, 0);
    assert_eq!(client.total_calls(), 0);
}

#[test]
fn zero_workers_are_rejected() {
    let client = Arc::new(ScriptedClient::new(Reply::Rows(1)));
    let sink = Arc::new(RecordingSink::default());
    let session = session_with(vec![("NED", 2, 0, client)], &sink);
    let sources = support::sources(2);
    let radii = support::radii(&sources);

    let err = session.run_database("NED", &sources, &radii, options(5, 0)).unwrap_err();
    assert!(matches!(err, XrefError::InvalidRequest(_)));
    assert_eq!(sink.prepares.load(Ordering::SeqCst), 0);
}

#[test]
fn rejected_options_keep_the_stored_table() {
    let client = Arc::new(ScriptedClient::new(Reply::Rows(1)));
    let sink = Arc::new(RecordingSink::default());
    let session = session_with(vec![("NED", 2, 0, Arc::clone(&client))], &sink);
    let sources = support::sources(4);
    let radii = support::radii(&sources);
    session.run_database("NED", &sources, &radii, options(2, 2)).unwrap();
    assert_eq!(sink.rows("NED").len(), 4);

    let overwrite = XrefOptions {
        overwrite: true,
        ..options(0, 2)
    };
    let err = session.run_database("NED", &sources, &radii, overwrite).unwrap_err();

    assert!(matches!(err, XrefError::InvalidRequest(_)));
    assert_eq!(sink.prepares.load(Ordering::SeqCst), 1);
    assert_eq!(sink.rows("NED").len(), 4);
}
