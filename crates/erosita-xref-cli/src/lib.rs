// crates/erosita-xref-cli/src/lib.rs
// ============================================================================
// Module: eROSITA XREF CLI Library
// Description: Shared helpers for the erosita-xref command-line interface.
// Purpose: Catalog ingestion and engine wiring for the binary and tests.
// Dependencies: erosita-xref-{core,config,providers,store-sqlite}, serde_json
// ============================================================================

//! ## Overview
//! The binary entry point (`src/main.rs`) stays thin: it parses arguments,
//! installs logging, and delegates to the helpers here.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod catalog;
pub mod wiring;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::CatalogError;
pub use catalog::parse_catalog;
pub use catalog::read_catalog;
pub use wiring::WiringError;
pub use wiring::build_registry;
pub use wiring::phase_line;
pub use wiring::tap_client_config;
