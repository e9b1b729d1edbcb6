// crates/erosita-xref-config/src/defaults.rs
// ============================================================================
// Module: Config Defaults
// Description: Built-in NED and SIMBAD database definitions.
// Purpose: Usable runs without a config file, and the example config.
// Dependencies: erosita-xref-core, toml
// ============================================================================

//! ## Overview
//! Built-in reference databases. Call rates and thread caps stay below the
//! published fair-use limits of each service.

use erosita_xref_core::ColumnKind;
use erosita_xref_core::ColumnMapping;

use crate::config::DatabaseConfig;
use crate::config::XrefConfig;

/// NED synchronous TAP endpoint.
pub const NED_TAP_ENDPOINT: &str = "https://ned.ipac.caltech.edu/tap/sync";
/// SIMBAD synchronous TAP endpoint.
pub const SIMBAD_TAP_ENDPOINT: &str = "https://simbad.cds.unistra.fr/simbad/sim-tap/sync";

/// Returns the built-in NED and SIMBAD definitions.
#[must_use]
pub fn builtin_databases() -> Vec<DatabaseConfig> {
    vec![ned(), simbad()]
}

/// NASA/IPAC Extragalactic Database.
fn ned() -> DatabaseConfig {
    DatabaseConfig {
        name: "NED".to_string(),
        endpoint: NED_TAP_ENDPOINT.to_string(),
        table: "NEDTAP.objdir".to_string(),
        ra_column: "ra".to_string(),
        dec_column: "dec".to_string(),
        max_call_rate: 2.0,
        max_threads: 4,
        retries: 3,
        timeout_ms: 30_000,
        user_agent: None,
        columns: vec![
            ColumnMapping::new("prefname", "OBJECT_NAME", ColumnKind::Text),
            ColumnMapping::new("ra", "RA", ColumnKind::Real),
            ColumnMapping::new("dec", "DEC", ColumnKind::Real),
            ColumnMapping::new("pretype", "TYPE", ColumnKind::Text),
            ColumnMapping::new("z", "REDSHIFT", ColumnKind::Real),
        ],
    }
}

/// CDS SIMBAD astronomical database.
fn simbad() -> DatabaseConfig {
    DatabaseConfig {
        name: "SIMBAD".to_string(),
        endpoint: SIMBAD_TAP_ENDPOINT.to_string(),
        table: "basic".to_string(),
        ra_column: "ra".to_string(),
        dec_column: "dec".to_string(),
        max_call_rate: 5.0,
        max_threads: 5,
        retries: 3,
        timeout_ms: 30_000,
        user_agent: None,
        columns: vec![
            ColumnMapping::new("main_id", "MAIN_ID", ColumnKind::Text),
            ColumnMapping::new("ra", "RA", ColumnKind::Real),
            ColumnMapping::new("dec", "DEC", ColumnKind::Real),
            ColumnMapping::new("otype", "OTYPE", ColumnKind::Text),
            ColumnMapping::new("coo_err_maj", "COO_ERR_MAJA", ColumnKind::Real),
            ColumnMapping::new("coo_err_min", "COO_ERR_MINA", ColumnKind::Real),
            ColumnMapping::new("coo_bibcode", "COO_BIBCODE", ColumnKind::Text),
        ],
    }
}

/// Returns the built-in configuration rendered as TOML.
///
/// # Errors
///
/// Returns [`crate::ConfigError::Parse`] when serialization fails.
pub fn config_toml_example() -> Result<String, crate::ConfigError> {
    XrefConfig::default().to_toml_string()
}
