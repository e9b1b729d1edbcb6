// crates/erosita-xref-config/src/lib.rs
// ============================================================================
// Module: eROSITA XREF Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for erosita-xref.toml semantics.
// Dependencies: erosita-xref-core, erosita-xref-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `erosita-xref-config` defines the configuration model for cross-reference
//! runs: the `SQLite` store, dispatch options, and the reference databases
//! with their call-rate limits and column mappings. Validation fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod defaults;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use defaults::builtin_databases;
pub use defaults::config_toml_example;
