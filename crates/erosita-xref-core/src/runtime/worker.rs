// crates/erosita-xref-core/src/runtime/worker.rs
// ============================================================================
// Module: Query Worker
// Description: Sequential per-source querying for one group.
// Purpose: Turn a query group into canonical match rows and a failure list.
// Dependencies: crate::{core, interfaces, runtime}, tracing
// ============================================================================

//! ## Overview
//! A [`QueryWorker`] walks its group in order. Every call is paced by the
//! shared [`RateLimiter`], classified into a [`CallOutcome`], and fed through
//! the per-source [`SourceState`] machine:
//!
//! `Pending -> Querying -> {Succeeded | Retrying -> Querying | Failed}`
//!
//! Only timeouts are retried. Per-source failures are collected and returned
//! alongside the group's [`ResultTable`]; nothing escapes the worker boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tracing::debug;
use tracing::warn;

use crate::core::Angle;
use crate::core::CellValue;
use crate::core::DatabaseDescriptor;
use crate::core::MatchRow;
use crate::core::RemoteTable;
use crate::core::ResultTable;
use crate::core::SourceRecord;
use crate::core::TableSchema;
use crate::interfaces::RemoteCatalogClient;
use crate::interfaces::RemoteError;
use crate::runtime::partition::QueryGroup;
use crate::runtime::rate_limit::RateLimiter;

// ============================================================================
// SECTION: Call Outcomes
// ============================================================================

/// Classified result of a single remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// The service returned rows.
    Rows(RemoteTable),
    /// The service reported no match.
    NoMatch,
    /// Transient failure; the call may be retried.
    Retryable(RemoteError),
    /// Permanent failure; the source fails immediately.
    Fatal(RemoteError),
}

impl CallOutcome {
    /// Classifies a raw client result.
    ///
    /// A missing table and an empty table are both treated as no match.
    #[must_use]
    pub fn classify(result: Result<Option<RemoteTable>, RemoteError>) -> Self {
        match result {
            Ok(Some(table)) if !table.is_empty() => Self::Rows(table),
            Ok(_) => Self::NoMatch,
            Err(err) if err.is_transient() => Self::Retryable(err),
            Err(err) => Self::Fatal(err),
        }
    }
}

// ============================================================================
// SECTION: Source State
// ============================================================================

/// Per-source query state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    /// Not yet queried.
    Pending,
    /// A call is in flight.
    Querying {
        /// One-based attempt number.
        attempt: u32,
    },
    /// The last call timed out and another attempt is allowed.
    Retrying {
        /// Attempts made so far.
        attempt: u32,
    },
    /// Terminal: the source finished with zero or more rows.
    Succeeded {
        /// Number of match rows produced.
        rows: usize,
    },
    /// Terminal: the retry budget was exhausted or a fatal error occurred.
    Failed {
        /// Attempts made.
        attempts: u32,
    },
}

impl SourceState {
    /// Returns true for `Succeeded` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }

    /// Advances the state after a classified call.
    ///
    /// `retries` is the number of additional attempts allowed after the first.
    #[must_use]
    pub fn after_call(self, outcome: &CallOutcome, rows: usize, retries: u32) -> Self {
        let attempt = match self {
            Self::Querying {
                attempt,
            } => attempt,
            other => return other,
        };
        match outcome {
            CallOutcome::Rows(_) | CallOutcome::NoMatch => Self::Succeeded {
                rows,
            },
            CallOutcome::Retryable(_) if attempt <= retries => Self::Retrying {
                attempt,
            },
            CallOutcome::Retryable(_) | CallOutcome::Fatal(_) => Self::Failed {
                attempts: attempt,
            },
        }
    }

    /// Starts the next attempt from `Pending` or `Retrying`.
    #[must_use]
    pub const fn next_attempt(self) -> Self {
        match self {
            Self::Pending => Self::Querying {
                attempt: 1,
            },
            Self::Retrying {
                attempt,
            } => Self::Querying {
                attempt: attempt.saturating_add(1),
            },
            other => other,
        }
    }
}

// ============================================================================
// SECTION: Group Results
// ============================================================================

/// A source that permanently failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    /// Identifier of the failed source.
    pub source_id: i64,
    /// Attempts made before giving up.
    pub attempts: u32,
    /// Last error observed.
    pub error: RemoteError,
}

/// Everything a worker produced for one group.
#[derive(Debug, Clone)]
pub struct GroupOutcome {
    /// Group position in the partition.
    pub group_index: usize,
    /// Number of sources in the group.
    pub sources: usize,
    /// Accumulated match rows, grouped by source in query order.
    pub table: ResultTable,
    /// Sources that permanently failed.
    pub failures: Vec<SourceFailure>,
}

// ============================================================================
// SECTION: Query Worker
// ============================================================================

/// Runs the queries of one group against one database.
pub struct QueryWorker<'a> {
    /// Database being queried.
    descriptor: &'a DatabaseDescriptor,
    /// Remote client for the database.
    client: &'a dyn RemoteCatalogClient,
    /// Shared pacing for the pool.
    limiter: &'a RateLimiter,
    /// Canonical schema for produced rows.
    schema: &'a TableSchema,
}

impl<'a> QueryWorker<'a> {
    /// Creates a worker bound to one database.
    #[must_use]
    pub const fn new(
        descriptor: &'a DatabaseDescriptor,
        client: &'a dyn RemoteCatalogClient,
        limiter: &'a RateLimiter,
        schema: &'a TableSchema,
    ) -> Self {
        Self {
            descriptor,
            client,
            limiter,
            schema,
        }
    }

    /// Queries every source of `group` in order.
    #[must_use]
    pub fn run_group(&self, group: &QueryGroup<'_>) -> GroupOutcome {
        let mut table = ResultTable::new(self.descriptor.name.clone(), self.schema.clone());
        let mut failures = Vec::new();
        for (source, radius) in group.sources.iter().zip(group.radii) {
            match self.query_source(source, *radius) {
                Ok(rows) => table.rows.extend(rows),
                Err(failure) => failures.push(failure),
            }
        }
        debug!(
            database = %self.descriptor.name,
            group = group.index,
            rows = table.len(),
            failures = failures.len(),
            "query group finished"
        );
        GroupOutcome {
            group_index: group.index,
            sources: group.len(),
            table,
            failures,
        }
    }

    /// Drives one source to a terminal state.
    fn query_source(
        &self,
        source: &SourceRecord,
        radius: Angle,
    ) -> Result<Vec<MatchRow>, SourceFailure> {
        let retries = self.descriptor.retries;
        let mut state = SourceState::Pending;
        let mut last_error = None;
        let mut rows = Vec::new();
        while !state.is_terminal() {
            state = state.next_attempt();
            self.limiter.pace();
            let mut outcome = CallOutcome::classify(self.client.search(source.coord(), radius));
            if let CallOutcome::Rows(remote) = &outcome {
                match project_rows(self.descriptor, remote, source, radius) {
                    Ok(projected) => rows = projected,
                    Err(err) => outcome = CallOutcome::Fatal(err),
                }
            }
            state = state.after_call(&outcome, rows.len(), retries);
            match outcome {
                CallOutcome::Retryable(err) => {
                    if let SourceState::Retrying {
                        attempt,
                    } = state
                    {
                        debug!(
                            database = %self.descriptor.name,
                            source_id = source.id,
                            attempt,
                            error = %err,
                            "retrying source after timeout"
                        );
                    }
                    last_error = Some(err);
                }
                CallOutcome::Fatal(err) => last_error = Some(err),
                CallOutcome::Rows(_) | CallOutcome::NoMatch => {}
            }
        }
        match state {
            SourceState::Failed {
                attempts,
            } => {
                let error = last_error
                    .unwrap_or_else(|| RemoteError::Service("unknown failure".to_string()));
                warn!(
                    database = %self.descriptor.name,
                    source_id = source.id,
                    attempts,
                    error = %error,
                    "source query failed"
                );
                Err(SourceFailure {
                    source_id: source.id,
                    attempts,
                    error,
                })
            }
            _ => Ok(rows),
        }
    }
}

// ============================================================================
// SECTION: Projection
// ============================================================================

/// Projects a remote table onto canonical rows tagged with source provenance.
///
/// # Errors
///
/// Returns [`RemoteError::Parse`] when a mapped column is absent, a row is
/// shorter than the header, or a value cannot be coerced to its canonical
/// type.
pub fn project_rows(
    descriptor: &DatabaseDescriptor,
    remote: &RemoteTable,
    source: &SourceRecord,
    radius: Angle,
) -> Result<Vec<MatchRow>, RemoteError> {
    let indices = descriptor
        .column_mapping
        .iter()
        .map(|mapping| {
            remote.column_index(&mapping.remote).ok_or_else(|| {
                RemoteError::Parse(format!(
                    "{}: response lacks column {}",
                    descriptor.name, mapping.remote
                ))
            })
        })
        .collect::<Result<Vec<usize>, RemoteError>>()?;
    remote
        .rows
        .iter()
        .map(|row| {
            let values = descriptor
                .column_mapping
                .iter()
                .zip(&indices)
                .map(|(mapping, index)| {
                    let cell = row.get(*index).ok_or_else(|| {
                        RemoteError::Parse(format!(
                            "{}: row has {} cells, column {} is at {index}",
                            descriptor.name,
                            row.len(),
                            mapping.remote
                        ))
                    })?;
                    cell.clone().coerce(mapping.kind).map_err(|err| {
                        RemoteError::Parse(format!(
                            "{}: column {}: {err}",
                            descriptor.name, mapping.remote
                        ))
                    })
                })
                .collect::<Result<Vec<CellValue>, RemoteError>>()?;
            Ok(MatchRow {
                source_id: source.id,
                extent: source.extent,
                source_ra: source.ra,
                source_dec: source.dec,
                search_radius_arcmin: radius.arcmin(),
                provenance: descriptor.name.clone(),
                values,
            })
        })
        .collect()
}
