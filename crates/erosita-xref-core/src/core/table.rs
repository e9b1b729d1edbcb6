// crates/erosita-xref-core/src/core/table.rs
// ============================================================================
// Module: XREF Tables
// Description: Remote response tables, canonical match rows, and schemas.
// Purpose: Carry query results from remote clients to the result sink.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Remote services answer a cone search with a [`RemoteTable`] in their own
//! column vocabulary. Workers project it through the database's column
//! mapping into [`MatchRow`]s, which carry the mapped values plus provenance
//! columns identifying the originating source. A [`ResultTable`] collects the
//! rows of one group and always carries the canonical [`TableSchema`], so
//! every append to a persisted table uses the same column set.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::descriptor::ColumnKind;
use crate::core::descriptor::DatabaseDescriptor;
use crate::core::identifiers::DatabaseName;

// ============================================================================
// SECTION: Provenance Columns
// ============================================================================

/// A provenance column appended to every canonical schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvenanceColumn {
    /// Column name.
    pub name: &'static str,
    /// Column storage type.
    pub kind: ColumnKind,
}

/// Provenance columns, in stored order.
pub const PROVENANCE_COLUMNS: [ProvenanceColumn; 6] = [
    ProvenanceColumn {
        name: "SOURCE_ID",
        kind: ColumnKind::Integer,
    },
    ProvenanceColumn {
        name: "SOURCE_EXTENT",
        kind: ColumnKind::Real,
    },
    ProvenanceColumn {
        name: "SOURCE_RA",
        kind: ColumnKind::Real,
    },
    ProvenanceColumn {
        name: "SOURCE_DEC",
        kind: ColumnKind::Real,
    },
    ProvenanceColumn {
        name: "SEARCH_RADIUS",
        kind: ColumnKind::Real,
    },
    ProvenanceColumn {
        name: "SOURCE_DB",
        kind: ColumnKind::Text,
    },
];

// ============================================================================
// SECTION: Cell Values
// ============================================================================

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Missing value.
    Null,
    /// Integer value.
    Integer(i64),
    /// Floating-point value.
    Real(f64),
    /// Text value.
    Text(String),
}

impl CellValue {
    /// Converts the value to the storage type `kind`.
    ///
    /// Blank text and non-finite reals become [`CellValue::Null`].
    ///
    /// # Errors
    ///
    /// Returns a description when the value cannot be represented as `kind`.
    pub fn coerce(self, kind: ColumnKind) -> Result<Self, String> {
        match (self, kind) {
            (Self::Null, _) => Ok(Self::Null),
            (Self::Integer(value), ColumnKind::Integer) => Ok(Self::Integer(value)),
            #[allow(clippy::cast_precision_loss, reason = "Catalog integers fit f64 mantissa.")]
            (Self::Integer(value), ColumnKind::Real) => Ok(Self::Real(value as f64)),
            (Self::Integer(value), ColumnKind::Text) => Ok(Self::Text(value.to_string())),
            (Self::Real(value), _) if !value.is_finite() => Ok(Self::Null),
            (Self::Real(value), ColumnKind::Real) => Ok(Self::Real(value)),
            (Self::Real(value), ColumnKind::Integer) => real_to_integer(value).map(Self::Integer),
            (Self::Real(value), ColumnKind::Text) => Ok(Self::Text(value.to_string())),
            (Self::Text(value), _) if value.trim().is_empty() => Ok(Self::Null),
            (Self::Text(value), ColumnKind::Text) => Ok(Self::Text(value)),
            (Self::Text(value), ColumnKind::Integer) => value
                .trim()
                .parse::<i64>()
                .map(Self::Integer)
                .map_err(|_| format!("not an integer: {value}")),
            (Self::Text(value), ColumnKind::Real) => value
                .trim()
                .parse::<f64>()
                .map(Self::Real)
                .map_err(|_| format!("not a number: {value}")),
        }
    }
}

/// Converts an integral float into an integer.
fn real_to_integer(value: f64) -> Result<i64, String> {
    // 2^63 bounds; anything outside cannot round-trip.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if value.fract() != 0.0 || value >= LIMIT || value < -LIMIT {
        return Err(format!("not an integer: {value}"));
    }
    #[allow(clippy::cast_possible_truncation, reason = "Range and integrality checked above.")]
    let integer = value as i64;
    Ok(integer)
}

// ============================================================================
// SECTION: Remote Table
// ============================================================================

/// Rows returned by a remote cone search, in the service's own columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteTable {
    /// Remote column names.
    pub columns: Vec<String>,
    /// Row values aligned with `columns`.
    pub rows: Vec<Vec<CellValue>>,
}

impl RemoteTable {
    /// Creates a remote table.
    #[must_use]
    pub const fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            columns,
            rows,
        }
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Finds a column by exact name, falling back to a case-insensitive match.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column == name)
            .or_else(|| self.columns.iter().position(|column| column.eq_ignore_ascii_case(name)))
    }
}

// ============================================================================
// SECTION: Canonical Schema
// ============================================================================

/// A canonical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name.
    pub name: String,
    /// Column storage type.
    pub kind: ColumnKind,
}

/// Canonical schema of a persisted XREF table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Columns in stored order: mapped columns, then provenance columns.
    pub columns: Vec<ColumnSpec>,
}

impl TableSchema {
    /// Builds the canonical schema for a database descriptor.
    #[must_use]
    pub fn for_descriptor(descriptor: &DatabaseDescriptor) -> Self {
        let mapped = descriptor.column_mapping.iter().map(|mapping| ColumnSpec {
            name: mapping.canonical.clone(),
            kind: mapping.kind,
        });
        let provenance = PROVENANCE_COLUMNS.iter().map(|column| ColumnSpec {
            name: column.name.to_string(),
            kind: column.kind,
        });
        Self {
            columns: mapped.chain(provenance).collect(),
        }
    }

    /// Returns the column names in stored order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    /// Returns true when `names` is exactly this schema's column set.
    ///
    /// Comparison ignores ASCII case, matching `SQLite` identifier rules.
    #[must_use]
    pub fn matches_columns<S: AsRef<str>>(&self, names: &[S]) -> bool {
        if names.len() != self.columns.len() {
            return false;
        }
        let mut expected: Vec<String> =
            self.columns.iter().map(|column| column.name.to_ascii_uppercase()).collect();
        let mut actual: Vec<String> =
            names.iter().map(|name| name.as_ref().to_ascii_uppercase()).collect();
        expected.sort();
        actual.sort();
        expected == actual
    }
}

// ============================================================================
// SECTION: Match Rows
// ============================================================================

/// One external-catalog match for one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRow {
    /// Identifier of the originating source.
    pub source_id: i64,
    /// Extent of the originating source.
    pub extent: f64,
    /// Right ascension of the originating source (degrees).
    pub source_ra: f64,
    /// Declination of the originating source (degrees).
    pub source_dec: f64,
    /// Search radius used for the query (arcminutes).
    pub search_radius_arcmin: f64,
    /// Database that produced the match.
    pub provenance: DatabaseName,
    /// Mapped values, aligned with the descriptor's column mapping.
    pub values: Vec<CellValue>,
}

impl MatchRow {
    /// Returns all cells in canonical schema order.
    #[must_use]
    pub fn cells(&self) -> Vec<CellValue> {
        let mut cells = Vec::with_capacity(self.values.len() + PROVENANCE_COLUMNS.len());
        cells.extend(self.values.iter().cloned());
        cells.push(CellValue::Integer(self.source_id));
        cells.push(CellValue::Real(self.extent));
        cells.push(CellValue::Real(self.source_ra));
        cells.push(CellValue::Real(self.source_dec));
        cells.push(CellValue::Real(self.search_radius_arcmin));
        cells.push(CellValue::Text(self.provenance.as_str().to_string()));
        cells
    }
}

/// Ordered match rows produced by one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    /// Database the rows came from.
    pub database: DatabaseName,
    /// Canonical schema of the rows.
    pub schema: TableSchema,
    /// Match rows, grouped by source in query order.
    pub rows: Vec<MatchRow>,
}

impl ResultTable {
    /// Creates an empty result table.
    #[must_use]
    pub const fn new(database: DatabaseName, schema: TableSchema) -> Self {
        Self {
            database,
            schema,
            rows: Vec::new(),
        }
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the persisted table name for this result.
    #[must_use]
    pub fn table_name(&self) -> String {
        self.database.table_name()
    }
}
