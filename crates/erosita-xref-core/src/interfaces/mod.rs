// crates/erosita-xref-core/src/interfaces/mod.rs
// ============================================================================
// Module: XREF Interfaces
// Description: Backend-agnostic interfaces for remote catalogs and storage.
// Purpose: Define the contract surfaces used by the dispatch runtime.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The dispatch engine talks to the outside world through three seams:
//! [`RemoteCatalogClient`] for cone searches, [`ResultSink`] for persisting
//! match tables, and [`ProgressObserver`] for completion reporting. All three
//! are shared across worker threads and must be `Send + Sync`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::Angle;
use crate::core::DatabaseName;
use crate::core::RemoteTable;
use crate::core::ResultTable;
use crate::core::SkyCoord;
use crate::core::TableSchema;

// ============================================================================
// SECTION: Remote Catalog Client
// ============================================================================

/// Remote cone-search failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The call timed out or the service was temporarily unavailable.
    #[error("remote timeout: {0}")]
    Timeout(String),
    /// The service rejected the call or failed permanently.
    #[error("remote service error: {0}")]
    Service(String),
    /// The response could not be parsed or projected.
    #[error("remote response parse error: {0}")]
    Parse(String),
}

impl RemoteError {
    /// Returns true when the failure is worth retrying.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// A reference database that answers cone searches.
pub trait RemoteCatalogClient: Send + Sync {
    /// Searches for catalog entries within `radius` of `center`.
    ///
    /// Returns `Ok(None)` when the service reports no match.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Timeout`] for transient failures and
    /// [`RemoteError::Service`] or [`RemoteError::Parse`] otherwise.
    fn search(&self, center: SkyCoord, radius: Angle) -> Result<Option<RemoteTable>, RemoteError>;
}

// ============================================================================
// SECTION: Result Sink
// ============================================================================

/// Result sink errors.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Sink I/O error.
    #[error("xref store io error: {0}")]
    Io(String),
    /// Storage engine error.
    #[error("xref store db error: {0}")]
    Db(String),
    /// Appended columns differ from the persisted table.
    #[error("xref store schema mismatch for {table}: expected [{expected}], found [{actual}]")]
    SchemaMismatch {
        /// Table name.
        table: String,
        /// Persisted column list.
        expected: String,
        /// Offered column list.
        actual: String,
    },
    /// Table already exists and overwrite was not requested.
    #[error("xref table already exists: {0} (overwrite disabled)")]
    TableExists(String),
    /// Invalid input to the sink.
    #[error("xref store invalid data: {0}")]
    Invalid(String),
}

/// Append-only destination for match tables.
///
/// Implementations must serialize appends: concurrent callers never
/// interleave writes to the same table.
pub trait ResultSink: Send + Sync {
    /// Prepares the persisted table for `database` before a run.
    ///
    /// Creates the table with `schema` when absent. When the table exists,
    /// drops and recreates it if `overwrite` is set.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::TableExists`] when the table exists and
    /// `overwrite` is false.
    fn prepare(
        &self,
        database: &DatabaseName,
        schema: &TableSchema,
        overwrite: bool,
    ) -> Result<(), SinkError>;

    /// Appends all rows of `table` in a single commit and returns the row count.
    ///
    /// Empty tables are a no-op. The persisted table is created on first use.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::SchemaMismatch`] when the persisted columns differ
    /// from `table.schema`, or another [`SinkError`] when the write fails.
    fn append(&self, table: &ResultTable) -> Result<usize, SinkError>;
}

// ============================================================================
// SECTION: Progress Observer
// ============================================================================

/// Receives incremental completion counts during a run.
pub trait ProgressObserver: Send + Sync {
    /// Called each time a group finishes.
    ///
    /// `completed` counts sources finished so far out of `total`; counts are
    /// monotonic within a run.
    fn sources_completed(&self, database: &DatabaseName, completed: usize, total: usize);
}
