// crates/erosita-xref-store-sqlite/src/lib.rs
// ============================================================================
// Module: eROSITA XREF SQLite Store
// Description: Durable ResultSink backend using SQLite.
// Purpose: Persist one append-only XREF table per reference database.
// Dependencies: erosita-xref-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`erosita_xref_core::ResultSink`].
//! Every write holds a process-wide mutex around a freshly opened connection,
//! so concurrent workers never interleave appends and no connection outlives
//! its commit.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SOURCE_TABLE;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
pub use store::SqliteXrefStore;
