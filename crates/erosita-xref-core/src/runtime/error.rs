// crates/erosita-xref-core/src/runtime/error.rs
// ============================================================================
// Module: XREF Runtime Errors
// Description: Run-aborting errors raised by the dispatch runtime.
// Purpose: Separate pre-flight failures from per-source failures.
// Dependencies: thiserror, crate::interfaces
// ============================================================================

//! ## Overview
//! [`XrefError`] covers only failures that stop a run (or a database phase)
//! before work is dispatched. Per-source failures are data, reported in
//! [`crate::runtime::RunSummary`], and store write failures during a run are
//! counted rather than raised.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::interfaces::SinkError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Run-aborting dispatch errors.
#[derive(Debug, Error)]
pub enum XrefError {
    /// Source and radius sequences differ in length.
    #[error("shape mismatch: {sources} sources but {radii} radii")]
    ShapeMismatch {
        /// Number of sources supplied.
        sources: usize,
        /// Number of radii supplied.
        radii: usize,
    },
    /// The requested database is not registered.
    #[error("unknown reference database: {0}")]
    UnknownDatabase(String),
    /// The run request is invalid (zero workers, zero group size, ...).
    #[error("invalid xref request: {0}")]
    InvalidRequest(String),
    /// The persisted table exists and overwrite was not requested.
    #[error("xref table already exists: {0}")]
    TableExists(String),
    /// The store failed during pre-flight preparation.
    #[error("xref store preparation failed: {0}")]
    Store(SinkError),
    /// The worker pool could not be created.
    #[error("worker pool error: {0}")]
    Pool(String),
}

impl From<SinkError> for XrefError {
    fn from(error: SinkError) -> Self {
        match error {
            SinkError::TableExists(table) => Self::TableExists(table),
            other => Self::Store(other),
        }
    }
}
