// crates/erosita-xref-cli/src/wiring.rs
// ============================================================================
// Module: Engine Wiring
// Description: Builds the database registry from configuration.
// Purpose: Connect configured databases to TAP clients and report phases.
// Dependencies: erosita-xref-config, erosita-xref-core, erosita-xref-providers
// ============================================================================

//! ## Overview
//! Every configured database becomes a [`DatabaseEntry`] backed by a
//! [`TapCatalogClient`] that selects exactly the mapped remote columns.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use erosita_xref_config::DatabaseConfig;
use erosita_xref_config::XrefConfig;
use erosita_xref_core::DatabaseEntry;
use erosita_xref_core::DatabasePhase;
use erosita_xref_core::DatabaseRegistry;
use erosita_xref_providers::TapCatalogClient;
use erosita_xref_providers::TapClientConfig;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Registry construction errors.
#[derive(Debug, Error)]
pub enum WiringError {
    /// A TAP client could not be created.
    #[error("database {database}: {message}")]
    Client {
        /// Database name.
        database: String,
        /// Failure description.
        message: String,
    },
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Returns the TAP client settings for a configured database.
#[must_use]
pub fn tap_client_config(database: &DatabaseConfig) -> TapClientConfig {
    let mut config = TapClientConfig::new(database.endpoint.clone(), database.table.clone());
    config.ra_column.clone_from(&database.ra_column);
    config.dec_column.clone_from(&database.dec_column);
    config.select_columns = database.remote_columns();
    config.timeout_ms = database.timeout_ms;
    if let Some(agent) = &database.user_agent {
        config.user_agent.clone_from(agent);
    }
    config
}

/// Builds a registry holding every configured database.
///
/// # Errors
///
/// Returns [`WiringError`] when a client cannot be built or a descriptor is
/// rejected by the registry.
pub fn build_registry(config: &XrefConfig) -> Result<DatabaseRegistry, WiringError> {
    let mut registry = DatabaseRegistry::new();
    for database in &config.databases {
        let client = TapCatalogClient::new(tap_client_config(database)).map_err(|err| {
            WiringError::Client {
                database: database.name.clone(),
                message: err.to_string(),
            }
        })?;
        registry
            .register(DatabaseEntry::new(database.descriptor(), Arc::new(client)))
            .map_err(|err| WiringError::Client {
                database: database.name.clone(),
                message: err.to_string(),
            })?;
    }
    Ok(registry)
}

// ============================================================================
// SECTION: Reporting
// ============================================================================

/// Formats one database phase as a single summary line.
#[must_use]
pub fn phase_line(phase: &DatabasePhase) -> String {
    match &phase.result {
        Ok(summary) => format!(
            "{}: {} sources, {} groups, {} workers, {} rows written, {} failed sources, {} store \
             failures ({} rows lost), {:.1}s",
            phase.database,
            summary.sources,
            summary.groups,
            summary.effective_workers,
            summary.rows_written,
            summary.error_count,
            summary.store_failures,
            summary.lost_rows,
            summary.elapsed.as_secs_f64(),
        ),
        Err(err) => format!("{}: aborted: {err}", phase.database),
    }
}
