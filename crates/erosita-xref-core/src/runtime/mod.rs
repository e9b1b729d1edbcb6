// crates/erosita-xref-core/src/runtime/mod.rs
// ============================================================================
// Module: XREF Runtime
// Description: Partitioning, pacing, workers, and the coordinating pool.
// Purpose: Execute rate-limited cone-search runs against reference databases.
// Dependencies: crate::{core, interfaces}, rayon, tracing
// ============================================================================

//! ## Overview
//! Runtime modules turn a source list and a database entry into persisted
//! match tables. The [`XrefSession`] performs pre-flight checks, the
//! [`QueryCoordinator`] owns the pool, and each [`QueryWorker`] processes one
//! group sequentially under the shared [`RateLimiter`].

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod coordinator;
pub mod error;
pub mod memory_sink;
pub mod partition;
pub mod progress;
pub mod rate_limit;
pub mod registry;
pub mod session;
pub mod worker;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use coordinator::QueryCoordinator;
pub use coordinator::RunSummary;
pub use error::XrefError;
pub use memory_sink::InMemoryResultSink;
pub use memory_sink::StoredTable;
pub use partition::QueryGroup;
pub use partition::build_groups;
pub use partition::partition_ranges;
pub use progress::LoggingProgress;
pub use progress::ProgressCounter;
pub use rate_limit::CallPacer;
pub use rate_limit::RateLimiter;
pub use rate_limit::call_interval;
pub use registry::DatabaseEntry;
pub use registry::DatabaseRegistry;
pub use session::DEFAULT_GROUP_SIZE;
pub use session::DEFAULT_MAX_WORKERS;
pub use session::DatabasePhase;
pub use session::XrefOptions;
pub use session::XrefReport;
pub use session::XrefSession;
pub use session::broadcast_radii;
pub use worker::CallOutcome;
pub use worker::GroupOutcome;
pub use worker::QueryWorker;
pub use worker::SourceFailure;
pub use worker::SourceState;
pub use worker::project_rows;
