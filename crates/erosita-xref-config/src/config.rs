// crates/erosita-xref-config/src/config.rs
// ============================================================================
// Module: eROSITA XREF Configuration
// Description: Configuration loading and validation for cross-reference runs.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: erosita-xref-core, erosita-xref-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, else `EROSITA_XREF_CONFIG`, else
//! `erosita-xref.toml` in the working directory. Only the implicit default
//! file may be absent; built-in defaults apply in that case.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use erosita_xref_core::ColumnMapping;
use erosita_xref_core::DatabaseDescriptor;
use erosita_xref_core::DatabaseName;
use erosita_xref_core::XrefOptions;
use erosita_xref_store_sqlite::SqliteStoreConfig;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::defaults::builtin_databases;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "erosita-xref.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "EROSITA_XREF_CONFIG";
/// Default `SQLite` output file.
pub const DEFAULT_STORE_PATH: &str = "erosita-xref.db";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of configured databases.
pub(crate) const MAX_DATABASES: usize = 64;
/// Maximum number of mapped columns per database.
pub(crate) const MAX_COLUMNS: usize = 256;
/// Maximum sources per query group.
pub(crate) const MAX_GROUP_SIZE: usize = 100_000;
/// Maximum requested worker count.
pub(crate) const MAX_WORKERS: usize = 256;
/// Maximum retries per source.
pub(crate) const MAX_RETRIES: u32 = 100;
/// Minimum remote request timeout in milliseconds.
pub(crate) const MIN_TIMEOUT_MS: u64 = 100;
/// Maximum remote request timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 600_000;
/// Default remote request timeout in milliseconds.
pub(crate) const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Maximum user agent length.
pub(crate) const MAX_USER_AGENT_LENGTH: usize = 256;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Top-level cross-reference configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct XrefConfig {
    /// Result store settings.
    #[serde(default = "default_store")]
    pub store: SqliteStoreConfig,
    /// Dispatch options.
    #[serde(default)]
    pub run: XrefOptions,
    /// Reference databases available to runs.
    #[serde(default = "builtin_databases")]
    pub databases: Vec<DatabaseConfig>,
}

impl Default for XrefConfig {
    fn default() -> Self {
        Self {
            store: default_store(),
            run: XrefOptions::default(),
            databases: builtin_databases(),
        }
    }
}

impl XrefConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(resolved) = resolve_path(path)? else {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        };
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        Self::from_toml_bytes(&bytes)
    }

    /// Parses and validates configuration from TOML bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bytes are oversized, not UTF-8, not
    /// valid TOML, or fail validation.
    pub fn from_toml_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("store.path", &self.store.path.to_string_lossy())?;
        validate_run(&self.run)?;
        if self.databases.len() > MAX_DATABASES {
            return Err(ConfigError::Invalid(format!(
                "databases exceeds max of {MAX_DATABASES}"
            )));
        }
        let mut names = BTreeSet::new();
        for database in &self.databases {
            database.validate()?;
            if !names.insert(database.name.to_ascii_uppercase()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate database name: {}",
                    database.name
                )));
            }
        }
        Ok(())
    }

    /// Returns the database with `name`, ignoring ASCII case.
    #[must_use]
    pub fn database(&self, name: &str) -> Option<&DatabaseConfig> {
        self.databases.iter().find(|database| database.name.eq_ignore_ascii_case(name))
    }

    /// Returns configured database names in file order.
    #[must_use]
    pub fn database_names(&self) -> Vec<&str> {
        self.databases.iter().map(|database| database.name.as_str()).collect()
    }

    /// Serializes the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|err| ConfigError::Parse(err.to_string()))
    }
}

/// Returns the default store configuration.
fn default_store() -> SqliteStoreConfig {
    SqliteStoreConfig::new(PathBuf::from(DEFAULT_STORE_PATH))
}

/// Validates dispatch options.
fn validate_run(run: &XrefOptions) -> Result<(), ConfigError> {
    if run.group_size == 0 || run.group_size > MAX_GROUP_SIZE {
        return Err(ConfigError::Invalid(format!(
            "run.group_size must be between 1 and {MAX_GROUP_SIZE}"
        )));
    }
    if run.max_workers == 0 || run.max_workers > MAX_WORKERS {
        return Err(ConfigError::Invalid(format!(
            "run.max_workers must be between 1 and {MAX_WORKERS}"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Database Config
// ============================================================================

/// One reference database reachable over TAP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database name; also the `XREF_<name>` table suffix.
    pub name: String,
    /// Synchronous TAP endpoint.
    pub endpoint: String,
    /// Remote table queried by the cone search.
    pub table: String,
    /// Right ascension column of the remote table.
    #[serde(default = "default_ra_column")]
    pub ra_column: String,
    /// Declination column of the remote table.
    #[serde(default = "default_dec_column")]
    pub dec_column: String,
    /// Maximum aggregate call rate (calls per second).
    pub max_call_rate: f64,
    /// Maximum concurrent worker threads.
    pub max_threads: usize,
    /// Retries after a transient failure.
    #[serde(default)]
    pub retries: u32,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Optional user agent override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Ordered remote-to-canonical column mapping.
    pub columns: Vec<ColumnMapping>,
}

impl DatabaseConfig {
    /// Builds the engine descriptor for this database.
    #[must_use]
    pub fn descriptor(&self) -> DatabaseDescriptor {
        DatabaseDescriptor {
            name: DatabaseName::new(self.name.clone()),
            max_call_rate: self.max_call_rate,
            max_threads: self.max_threads,
            retries: self.retries,
            column_mapping: self.columns.clone(),
        }
    }

    /// Returns the remote columns selected by the cone search.
    #[must_use]
    pub fn remote_columns(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.remote.clone()).collect()
    }

    /// Validates database settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let field = |suffix: &str| format!("databases.{}.{suffix}", self.name);
        self.descriptor().validate().map_err(ConfigError::Invalid)?;
        let endpoint = self.endpoint.trim();
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(ConfigError::Invalid(format!(
                "{} must include http:// or https://",
                field("endpoint")
            )));
        }
        if self.table.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("{} must be non-empty", field("table"))));
        }
        if self.ra_column.trim().is_empty() || self.dec_column.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "{} and dec_column must be non-empty",
                field("ra_column")
            )));
        }
        if self.retries > MAX_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "{} exceeds max of {MAX_RETRIES}",
                field("retries")
            )));
        }
        if !(MIN_TIMEOUT_MS ..= MAX_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "{} must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}",
                field("timeout_ms")
            )));
        }
        if self.columns.len() > MAX_COLUMNS {
            return Err(ConfigError::Invalid(format!(
                "{} exceeds max of {MAX_COLUMNS}",
                field("columns")
            )));
        }
        if let Some(agent) = &self.user_agent
            && (agent.trim().is_empty() || agent.len() > MAX_USER_AGENT_LENGTH)
        {
            return Err(ConfigError::Invalid(format!(
                "{} must be 1..={MAX_USER_AGENT_LENGTH} characters",
                field("user_agent")
            )));
        }
        Ok(())
    }
}

/// Default right ascension column.
fn default_ra_column() -> String {
    "ra".to_string()
}

/// Default declination column.
fn default_dec_column() -> String {
    "dec".to_string()
}

/// Default remote request timeout.
const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Path Helpers
// ============================================================================

/// Resolves the config path; `None` means use built-in defaults.
fn resolve_path(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(Some(PathBuf::from(env_path)));
    }
    let default_path = PathBuf::from(DEFAULT_CONFIG_NAME);
    Ok(default_path.is_file().then_some(default_path))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}
