// crates/erosita-xref-core/src/core/descriptor.rs
// ============================================================================
// Module: Database Descriptors
// Description: Static per-database limits and column mappings.
// Purpose: Describe how a reference database may be queried and stored.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`DatabaseDescriptor`] carries everything the engine needs to know about
//! one reference database: its call-rate budget, thread cap, retry budget and
//! the mapping from remote column names to canonical stored columns.
//! Descriptors are immutable once built; validation happens in the config
//! layer and again in [`DatabaseDescriptor::validate`] at registration.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::DatabaseName;
use crate::core::identifiers::is_sql_identifier;
use crate::core::table::PROVENANCE_COLUMNS;

// ============================================================================
// SECTION: Column Mapping
// ============================================================================

/// Storage type of a canonical column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// 64-bit signed integer.
    Integer,
    /// 64-bit float.
    Real,
    /// UTF-8 text.
    Text,
}

impl ColumnKind {
    /// Returns the `SQLite` column type for this kind.
    #[must_use]
    pub const fn sql_type(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
        }
    }
}

/// Mapping of one remote column onto a canonical stored column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Column name as returned by the remote service.
    pub remote: String,
    /// Canonical column name in the persisted table.
    pub canonical: String,
    /// Storage type of the canonical column.
    pub kind: ColumnKind,
}

impl ColumnMapping {
    /// Creates a column mapping.
    #[must_use]
    pub fn new(remote: impl Into<String>, canonical: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            remote: remote.into(),
            canonical: canonical.into(),
            kind,
        }
    }
}

// ============================================================================
// SECTION: Database Descriptor
// ============================================================================

/// Static description of one reference database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseDescriptor {
    /// Database name (`NED`, `SIMBAD`, ...).
    pub name: DatabaseName,
    /// Maximum aggregate call rate allowed by the service (calls per second).
    pub max_call_rate: f64,
    /// Maximum number of concurrent worker threads for this service.
    pub max_threads: usize,
    /// Number of retries granted to a source after a transient failure.
    pub retries: u32,
    /// Ordered remote-to-canonical column mapping.
    pub column_mapping: Vec<ColumnMapping>,
}

impl DatabaseDescriptor {
    /// Returns the pool size for a run that requested `requested` workers.
    #[must_use]
    pub fn effective_threads(&self, requested: usize) -> usize {
        self.max_threads.min(requested)
    }

    /// Validates descriptor invariants.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        if !self.name.is_sql_safe() {
            return Err(format!("database name is not a valid identifier: {}", self.name));
        }
        if !self.max_call_rate.is_finite() || self.max_call_rate <= 0.0 {
            return Err(format!("{}: max_call_rate must be positive and finite", self.name));
        }
        if self.max_threads == 0 {
            return Err(format!("{}: max_threads must be at least 1", self.name));
        }
        if self.column_mapping.is_empty() {
            return Err(format!("{}: column mapping must not be empty", self.name));
        }
        let mut seen = BTreeSet::new();
        for mapping in &self.column_mapping {
            if mapping.remote.trim().is_empty() {
                return Err(format!("{}: remote column name must be non-empty", self.name));
            }
            if !is_sql_identifier(&mapping.canonical) {
                return Err(format!(
                    "{}: canonical column is not a valid identifier: {}",
                    self.name, mapping.canonical
                ));
            }
            let upper = mapping.canonical.to_ascii_uppercase();
            if PROVENANCE_COLUMNS.iter().any(|column| column.name == upper) {
                return Err(format!(
                    "{}: canonical column collides with provenance column: {}",
                    self.name, mapping.canonical
                ));
            }
            if !seen.insert(upper) {
                return Err(format!(
                    "{}: duplicate canonical column: {}",
                    self.name, mapping.canonical
                ));
            }
        }
        Ok(())
    }
}
