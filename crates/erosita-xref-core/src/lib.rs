// crates/erosita-xref-core/src/lib.rs
// ============================================================================
// Module: eROSITA XREF Core Library
// Description: Public API surface for the cross-match dispatch engine.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! eROSITA XREF core cross-matches primary-catalog sources against remote
//! reference databases (NED, SIMBAD) by cone search. Work is split into
//! groups, run on a bounded worker pool under each database's call-rate
//! budget, and appended to one persisted table per database. The engine is
//! backend-agnostic: remote services and storage plug in through
//! [`RemoteCatalogClient`] and [`ResultSink`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::ProgressObserver;
pub use interfaces::RemoteCatalogClient;
pub use interfaces::RemoteError;
pub use interfaces::ResultSink;
pub use interfaces::SinkError;
pub use runtime::DEFAULT_GROUP_SIZE;
pub use runtime::DEFAULT_MAX_WORKERS;
pub use runtime::DatabaseEntry;
pub use runtime::DatabasePhase;
pub use runtime::DatabaseRegistry;
pub use runtime::InMemoryResultSink;
pub use runtime::LoggingProgress;
pub use runtime::ProgressCounter;
pub use runtime::QueryCoordinator;
pub use runtime::RunSummary;
pub use runtime::SourceFailure;
pub use runtime::XrefError;
pub use runtime::XrefOptions;
pub use runtime::XrefReport;
pub use runtime::XrefSession;
