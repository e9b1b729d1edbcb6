// crates/erosita-xref-core/src/runtime/memory_sink.rs
// ============================================================================
// Module: XREF In-Memory Sink
// Description: Mutex-guarded in-memory result sink for tests and dry runs.
// Purpose: Provide a deterministic sink implementation without external deps.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryResultSink`] enforces the same table rules as the `SQLite` store:
//! tables are keyed by `XREF_<database>`, the column set is fixed on first
//! use, and an existing table is only replaced when overwrite is requested.
//! It is not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::CellValue;
use crate::core::DatabaseName;
use crate::core::ResultTable;
use crate::core::TableSchema;
use crate::interfaces::ResultSink;
use crate::interfaces::SinkError;

// ============================================================================
// SECTION: In-Memory Sink
// ============================================================================

/// A persisted table held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTable {
    /// Column names fixed at creation.
    pub columns: Vec<String>,
    /// Rows in append order, in `columns` order.
    pub rows: Vec<Vec<CellValue>>,
    /// Number of appends committed.
    pub commits: usize,
}

/// In-memory result sink.
#[derive(Debug, Default, Clone)]
pub struct InMemoryResultSink {
    /// Tables keyed by table name.
    tables: Arc<Mutex<BTreeMap<String, StoredTable>>>,
}

impl InMemoryResultSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the named table, if present.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Db`] when the sink mutex is poisoned.
    pub fn table(&self, table_name: &str) -> Result<Option<StoredTable>, SinkError> {
        let guard = self
            .tables
            .lock()
            .map_err(|_| SinkError::Db("result sink mutex poisoned".to_string()))?;
        Ok(guard.get(table_name).cloned())
    }

    /// Returns the stored table names.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Db`] when the sink mutex is poisoned.
    pub fn table_names(&self) -> Result<Vec<String>, SinkError> {
        let guard = self
            .tables
            .lock()
            .map_err(|_| SinkError::Db("result sink mutex poisoned".to_string()))?;
        Ok(guard.keys().cloned().collect())
    }
}

impl ResultSink for InMemoryResultSink {
    fn prepare(
        &self,
        database: &DatabaseName,
        schema: &TableSchema,
        overwrite: bool,
    ) -> Result<(), SinkError> {
        let table_name = database.table_name();
        let mut guard = self
            .tables
            .lock()
            .map_err(|_| SinkError::Db("result sink mutex poisoned".to_string()))?;
        if guard.contains_key(&table_name) && !overwrite {
            return Err(SinkError::TableExists(table_name));
        }
        guard.insert(table_name, empty_table(schema));
        Ok(())
    }

    fn append(&self, table: &ResultTable) -> Result<usize, SinkError> {
        if table.is_empty() {
            return Ok(0);
        }
        let table_name = table.table_name();
        let mut guard = self
            .tables
            .lock()
            .map_err(|_| SinkError::Db("result sink mutex poisoned".to_string()))?;
        let stored = guard.entry(table_name.clone()).or_insert_with(|| empty_table(&table.schema));
        if !table.schema.matches_columns(&stored.columns) {
            return Err(SinkError::SchemaMismatch {
                table: table_name,
                expected: stored.columns.join(", "),
                actual: table.schema.column_names().join(", "),
            });
        }
        let names = table.schema.column_names();
        let order: Vec<usize> = stored
            .columns
            .iter()
            .filter_map(|column| names.iter().position(|name| name.eq_ignore_ascii_case(column)))
            .collect();
        stored.rows.extend(table.rows.iter().map(|row| {
            let cells = row.cells();
            order.iter().map(|index| cells.get(*index).cloned().unwrap_or(CellValue::Null)).collect()
        }));
        stored.commits = stored.commits.saturating_add(1);
        Ok(table.len())
    }
}

/// Creates an empty stored table for `schema`.
fn empty_table(schema: &TableSchema) -> StoredTable {
    StoredTable {
        columns: schema.column_names().into_iter().map(str::to_string).collect(),
        rows: Vec::new(),
        commits: 0,
    }
}
