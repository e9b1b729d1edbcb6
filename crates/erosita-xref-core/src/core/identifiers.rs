// crates/erosita-xref-core/src/core/identifiers.rs
// ============================================================================
// Module: XREF Identifiers
// Description: Canonical identifiers for reference databases and tables.
// Purpose: Provide strongly typed database names with stable table naming.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Reference databases are selected by name (`NED`, `SIMBAD`). The name also
//! determines the persisted table, `XREF_<name>`. Names that end up inside SQL
//! statements must pass [`DatabaseName::is_sql_safe`] before use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix applied to every persisted cross-reference table.
pub const XREF_TABLE_PREFIX: &str = "XREF_";
/// Maximum length of a database name.
pub const MAX_DATABASE_NAME_LENGTH: usize = 64;

// ============================================================================
// SECTION: Database Name
// ============================================================================

/// Name of a reference database (for example `NED` or `SIMBAD`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseName(String);

impl DatabaseName {
    /// Creates a new database name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the persisted table name for this database.
    #[must_use]
    pub fn table_name(&self) -> String {
        format!("{XREF_TABLE_PREFIX}{}", self.0)
    }

    /// Returns true when the name is usable as part of an SQL identifier.
    #[must_use]
    pub fn is_sql_safe(&self) -> bool {
        is_sql_identifier(&self.0) && self.0.len() <= MAX_DATABASE_NAME_LENGTH
    }
}

impl fmt::Display for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for DatabaseName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DatabaseName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true when `value` is a plain ASCII SQL identifier.
///
/// Accepts `[A-Za-z_][A-Za-z0-9_]*`.
#[must_use]
pub fn is_sql_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

#[cfg(test)]
mod tests {
    use super::DatabaseName;
    use super::is_sql_identifier;

    #[test]
    fn table_name_uses_xref_prefix() {
        assert_eq!(DatabaseName::new("NED").table_name(), "XREF_NED");
    }

    #[test]
    fn sql_identifier_rules() {
        assert!(is_sql_identifier("SIMBAD"));
        assert!(is_sql_identifier("_x1"));
        assert!(!is_sql_identifier(""));
        assert!(!is_sql_identifier("1NED"));
        assert!(!is_sql_identifier("NED; DROP TABLE x"));
        assert!(!DatabaseName::new("a".repeat(65)).is_sql_safe());
    }
}
