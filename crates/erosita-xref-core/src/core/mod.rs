// crates/erosita-xref-core/src/core/mod.rs
// ============================================================================
// Module: XREF Core Types
// Description: Canonical source, descriptor, and table structures.
// Purpose: Provide stable, serializable types shared by every XREF crate.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Core types describe what flows through the dispatch engine: primary-catalog
//! sources in, reference-database descriptors alongside, and canonical match
//! tables out.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod descriptor;
pub mod identifiers;
pub mod sky;
pub mod source;
pub mod table;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use descriptor::ColumnKind;
pub use descriptor::ColumnMapping;
pub use descriptor::DatabaseDescriptor;
pub use identifiers::DatabaseName;
pub use identifiers::XREF_TABLE_PREFIX;
pub use identifiers::is_sql_identifier;
pub use sky::Angle;
pub use sky::SkyCoord;
pub use source::SourceRecord;
pub use source::search_radii;
pub use table::CellValue;
pub use table::ColumnSpec;
pub use table::MatchRow;
pub use table::PROVENANCE_COLUMNS;
pub use table::ProvenanceColumn;
pub use table::RemoteTable;
pub use table::ResultTable;
pub use table::TableSchema;
