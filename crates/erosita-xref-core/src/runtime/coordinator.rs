// crates/erosita-xref-core/src/runtime/coordinator.rs
// ============================================================================
// Module: Query Coordinator
// Description: Bounded worker pool fan-out and result fan-in for one database.
// Purpose: Run every query group exactly once and aggregate the outcome.
// Dependencies: crate::{core, interfaces, runtime}, rayon, tracing
// ============================================================================

//! ## Overview
//! [`QueryCoordinator::run`] validates the request, sizes a `rayon` pool to
//! `min(max_threads, worker_count)`, and spawns one job per query group. Jobs
//! beyond the pool size queue for a free thread. Each job runs its group,
//! appends the resulting table to the [`ResultSink`], and reports back over a
//! channel; the calling thread consumes reports as they arrive so progress is
//! logged incrementally. The run returns only after every job has finished.
//!
//! Store write failures are counted and logged. They never abort other jobs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use tracing::debug;
use tracing::error;
use tracing::info;

use crate::core::Angle;
use crate::core::DatabaseName;
use crate::core::SourceRecord;
use crate::core::TableSchema;
use crate::interfaces::ProgressObserver;
use crate::interfaces::ResultSink;
use crate::interfaces::SinkError;
use crate::runtime::error::XrefError;
use crate::runtime::partition::build_groups;
use crate::runtime::progress::LoggingProgress;
use crate::runtime::rate_limit::RateLimiter;
use crate::runtime::registry::DatabaseEntry;
use crate::runtime::worker::GroupOutcome;
use crate::runtime::worker::QueryWorker;
use crate::runtime::worker::SourceFailure;

// ============================================================================
// SECTION: Run Summary
// ============================================================================

/// Aggregate outcome of one database run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Database that was queried.
    pub database: DatabaseName,
    /// Number of sources dispatched.
    pub sources: usize,
    /// Number of query groups.
    pub groups: usize,
    /// Pool size actually used.
    pub effective_workers: usize,
    /// Per-thread call interval `T`.
    pub call_interval: Duration,
    /// Number of permanently failed sources.
    pub error_count: usize,
    /// Failed sources, in group order.
    pub failures: Vec<SourceFailure>,
    /// Rows committed to the sink.
    pub rows_written: usize,
    /// Group appends that failed.
    pub store_failures: usize,
    /// Rows dropped because their group append failed.
    pub lost_rows: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Message sent from a finished job to the coordinator.
struct GroupReport {
    /// Worker output for the group.
    outcome: GroupOutcome,
    /// Result of appending the group's table.
    written: Result<usize, SinkError>,
}

// ============================================================================
// SECTION: Coordinator
// ============================================================================

/// Owns the worker pool lifecycle for dispatch runs.
#[derive(Clone)]
pub struct QueryCoordinator {
    /// Destination for group tables.
    sink: Arc<dyn ResultSink>,
    /// Completion observer.
    progress: Arc<dyn ProgressObserver>,
}

impl QueryCoordinator {
    /// Creates a coordinator that logs progress through `tracing`.
    #[must_use]
    pub fn new(sink: Arc<dyn ResultSink>) -> Self {
        Self {
            sink,
            progress: Arc::new(LoggingProgress),
        }
    }

    /// Replaces the progress observer.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressObserver>) -> Self {
        self.progress = progress;
        self
    }

    /// Returns the result sink.
    #[must_use]
    pub fn sink(&self) -> &Arc<dyn ResultSink> {
        &self.sink
    }

    /// Checks run options against `entry` without touching the sink.
    ///
    /// Returns the rate limiter the run would use.
    ///
    /// # Errors
    ///
    /// Returns [`XrefError::ShapeMismatch`] when `sources` and `radii` differ
    /// in length, and [`XrefError::InvalidRequest`] for a zero worker count,
    /// a zero group size, or an unusable call rate.
    pub fn validate_request(
        entry: &DatabaseEntry,
        sources: usize,
        radii: usize,
        worker_count: usize,
        group_size: usize,
    ) -> Result<RateLimiter, XrefError> {
        if sources != radii {
            return Err(XrefError::ShapeMismatch {
                sources,
                radii,
            });
        }
        if worker_count == 0 {
            return Err(XrefError::InvalidRequest("worker count must be at least 1".to_string()));
        }
        if group_size == 0 {
            return Err(XrefError::InvalidRequest("group size must be at least 1".to_string()));
        }
        let descriptor = &entry.descriptor;
        RateLimiter::for_pool(descriptor.max_call_rate, descriptor.effective_threads(worker_count))
    }

    /// Queries every source against `entry` and appends matches to the sink.
    ///
    /// The persisted table is expected to be prepared already.
    ///
    /// # Errors
    ///
    /// Returns [`XrefError::ShapeMismatch`] when `sources` and `radii` differ
    /// in length, [`XrefError::InvalidRequest`] for a zero worker count or
    /// group size, and [`XrefError::Pool`] when the pool cannot be built.
    /// Per-source and store failures are reported in the [`RunSummary`].
    pub fn run(
        &self,
        entry: &DatabaseEntry,
        sources: &[SourceRecord],
        radii: &[Angle],
        worker_count: usize,
        group_size: usize,
    ) -> Result<RunSummary, XrefError> {
        let limiter =
            Self::validate_request(entry, sources.len(), radii.len(), worker_count, group_size)?;
        let descriptor = &entry.descriptor;
        let effective_workers = descriptor.effective_threads(worker_count);
        let groups = build_groups(sources, radii, group_size)?;
        let schema = TableSchema::for_descriptor(descriptor);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(effective_workers)
            .thread_name(|index| format!("xref-worker-{index}"))
            .build()
            .map_err(|err| XrefError::Pool(err.to_string()))?;

        info!(
            database = %descriptor.name,
            sources = sources.len(),
            groups = groups.len(),
            workers = effective_workers,
            interval_ms = limiter.interval().as_millis(),
            "starting cross-match run"
        );

        let started = Instant::now();
        let worker = QueryWorker::new(descriptor, entry.client.as_ref(), &limiter, &schema);
        let sink = self.sink.as_ref();
        let (tx, rx) = mpsc::channel::<GroupReport>();

        let mut summary = RunSummary {
            database: descriptor.name.clone(),
            sources: sources.len(),
            groups: groups.len(),
            effective_workers,
            call_interval: limiter.interval(),
            error_count: 0,
            failures: Vec::new(),
            rows_written: 0,
            store_failures: 0,
            lost_rows: 0,
            elapsed: Duration::ZERO,
        };
        let mut failures_by_group = Vec::new();

        thread::scope(|scope| {
            let groups = &groups;
            let worker = &worker;
            let pool = &pool;
            scope.spawn(move || {
                pool.scope(|jobs| {
                    for group in groups {
                        let tx = tx.clone();
                        jobs.spawn(move |_| {
                            let outcome = worker.run_group(group);
                            let written = if outcome.table.is_empty() {
                                Ok(0)
                            } else {
                                sink.append(&outcome.table)
                            };
                            if tx.send(GroupReport { outcome, written }).is_err() {
                                debug!(group = group.index, "coordinator stopped listening");
                            }
                        });
                    }
                });
            });

            let mut completed = 0_usize;
            while let Ok(report) = rx.recv() {
                let GroupReport {
                    outcome,
                    written,
                } = report;
                completed = completed.saturating_add(outcome.sources);
                match written {
                    Ok(rows) => summary.rows_written = summary.rows_written.saturating_add(rows),
                    Err(err) => {
                        summary.store_failures = summary.store_failures.saturating_add(1);
                        summary.lost_rows = summary.lost_rows.saturating_add(outcome.table.len());
                        error!(
                            database = %descriptor.name,
                            group = outcome.group_index,
                            rows = outcome.table.len(),
                            error = %err,
                            "failed to store group results"
                        );
                    }
                }
                summary.error_count = summary.error_count.saturating_add(outcome.failures.len());
                failures_by_group.push((outcome.group_index, outcome.failures));
                self.progress.sources_completed(&descriptor.name, completed, sources.len());
            }
        });

        failures_by_group.sort_by_key(|(index, _)| *index);
        summary.failures = failures_by_group.into_iter().flat_map(|(_, failures)| failures).collect();
        summary.elapsed = started.elapsed();

        info!(
            database = %summary.database,
            errors = summary.error_count,
            rows = summary.rows_written,
            store_failures = summary.store_failures,
            elapsed_ms = summary.elapsed.as_millis(),
            "cross-match run finished"
        );
        Ok(summary)
    }
}
