// crates/erosita-xref-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite XREF Store
// Description: Mutex-serialized XREF table persistence backed by SQLite.
// Purpose: Append group result tables and export the source catalog.
// Dependencies: erosita-xref-core, rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`SqliteXrefStore`] implements [`ResultSink`]. Each operation takes the
//! store mutex, opens a connection, runs one transaction, commits, and drops
//! the connection before releasing the mutex. Tables are named
//! `XREF_<database>` and carry the canonical schema fixed at creation; later
//! appends are checked against `PRAGMA table_info` and rejected on mismatch.
//! Store contents are untrusted: table names are validated identifiers and
//! every value is bound as a parameter.

// ============================================================================//
// SECTION: Imports
// ============================================================================//

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use erosita_xref_core::CellValue;
use erosita_xref_core::DatabaseName;
use erosita_xref_core::ResultSink;
use erosita_xref_core::ResultTable;
use erosita_xref_core::SinkError;
use erosita_xref_core::SourceRecord;
use erosita_xref_core::TableSchema;
use erosita_xref_core::is_sql_identifier;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use tracing::info;

// ============================================================================//
// SECTION: Constants
// ============================================================================//

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Table holding the exported source catalog.
pub const SOURCE_TABLE: &str = "EROSITA";

// ============================================================================//
// SECTION: Config
// ============================================================================//

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` XREF store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a config for `path` with default pragmas.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================//
// SECTION: Errors
// ============================================================================//

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Invalid store data or request.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Offered columns differ from the persisted table.
    #[error("sqlite store schema mismatch for {table}: expected [{expected}], found [{actual}]")]
    SchemaMismatch {
        /// Table name.
        table: String,
        /// Persisted column list.
        expected: String,
        /// Offered column list.
        actual: String,
    },
    /// Table exists and overwrite was not requested.
    #[error("sqlite store table already exists: {0}")]
    TableExists(String),
}

impl From<SqliteStoreError> for SinkError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Db(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::SchemaMismatch {
                table,
                expected,
                actual,
            } => Self::SchemaMismatch {
                table,
                expected,
                actual,
            },
            SqliteStoreError::TableExists(table) => Self::TableExists(table),
        }
    }
}

// ============================================================================//
// SECTION: Store
// ============================================================================//

/// `SQLite`-backed XREF store with one writer at a time.
#[derive(Debug, Clone)]
pub struct SqliteXrefStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Guard around every open-transaction-commit-close sequence.
    write_lock: Arc<Mutex<()>>,
}

impl SqliteXrefStore {
    /// Opens an `SQLite`-backed XREF store, creating the file if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is invalid or the database
    /// cannot be opened.
    pub fn open(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let connection = open_connection(&config)?;
        drop(connection);
        Ok(Self {
            config,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Returns the persisted column names of `table`, if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the table name is invalid or the
    /// query fails.
    pub fn table_columns(&self, table: &str) -> Result<Option<Vec<String>>, SqliteStoreError> {
        validate_table_name(table)?;
        self.with_transaction(|tx| {
            if table_exists(tx, table)? {
                table_info(tx, table).map(Some)
            } else {
                Ok(None)
            }
        })
    }

    /// Reads every row of `table` in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the table is missing or unreadable.
    pub fn read_rows(&self, table: &str) -> Result<Vec<Vec<CellValue>>, SqliteStoreError> {
        validate_table_name(table)?;
        self.with_transaction(|tx| {
            let sql = format!("SELECT * FROM {} ORDER BY rowid", quote_identifier(table));
            let mut statement =
                tx.prepare(&sql).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let width = statement.column_count();
            let rows = statement
                .query_map(params![], |row| {
                    (0 .. width)
                        .map(|index| row.get::<_, Value>(index).map(cell_from_value))
                        .collect::<Result<Vec<CellValue>, rusqlite::Error>>()
                })
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?
                .collect::<Result<Vec<Vec<CellValue>>, rusqlite::Error>>()
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            Ok(rows)
        })
    }

    /// Replaces the source catalog table with `sources`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the write fails.
    pub fn write_source_table(&self, sources: &[SourceRecord]) -> Result<usize, SqliteStoreError> {
        let written = self.with_transaction(|tx| {
            tx.execute_batch(&format!(
                "DROP TABLE IF EXISTS {table};
                 CREATE TABLE {table} (
                    SOURCE_ID INTEGER NOT NULL,
                    RA REAL NOT NULL,
                    DEC REAL NOT NULL,
                    EXTENT REAL NOT NULL,
                    SEARCH_RADIUS REAL NOT NULL
                 );",
                table = quote_identifier(SOURCE_TABLE)
            ))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let sql = format!(
                "INSERT INTO {} (SOURCE_ID, RA, DEC, EXTENT, SEARCH_RADIUS) VALUES (?1, ?2, ?3, \
                 ?4, ?5)",
                quote_identifier(SOURCE_TABLE)
            );
            let mut statement =
                tx.prepare(&sql).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            for source in sources {
                statement
                    .execute(params![
                        source.id,
                        source.ra,
                        source.dec,
                        source.extent,
                        source.search_radius.arcmin()
                    ])
                    .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            }
            Ok(sources.len())
        })?;
        info!(table = SOURCE_TABLE, rows = written, "wrote source catalog table");
        Ok(written)
    }

    /// Drops or refuses an existing table, then creates it with `schema`.
    fn prepare_table(
        &self,
        database: &DatabaseName,
        schema: &TableSchema,
        overwrite: bool,
    ) -> Result<(), SqliteStoreError> {
        let table = database.table_name();
        validate_table_name(&table)?;
        self.with_transaction(|tx| {
            if table_exists(tx, &table)? {
                if !overwrite {
                    return Err(SqliteStoreError::TableExists(table.clone()));
                }
                tx.execute_batch(&format!("DROP TABLE {};", quote_identifier(&table)))
                    .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
                info!(table = %table, "dropped existing xref table");
            }
            create_table(tx, &table, schema)
        })
    }

    /// Appends all rows of `result` in one transaction.
    fn append_table(&self, result: &ResultTable) -> Result<usize, SqliteStoreError> {
        if result.is_empty() {
            return Ok(0);
        }
        let table = result.table_name();
        validate_table_name(&table)?;
        let names = result.schema.column_names();
        for name in &names {
            if !is_sql_identifier(name) {
                return Err(SqliteStoreError::Invalid(format!("invalid column name: {name}")));
            }
        }
        let written = self.with_transaction(|tx| {
            if table_exists(tx, &table)? {
                let persisted = table_info(tx, &table)?;
                if !result.schema.matches_columns(&persisted) {
                    return Err(SqliteStoreError::SchemaMismatch {
                        table: table.clone(),
                        expected: persisted.join(", "),
                        actual: names.join(", "),
                    });
                }
            } else {
                create_table(tx, &table, &result.schema)?;
            }
            let columns =
                names.iter().map(|name| quote_identifier(name)).collect::<Vec<String>>().join(", ");
            let placeholders =
                (1 ..= names.len()).map(|index| format!("?{index}")).collect::<Vec<String>>();
            let sql = format!(
                "INSERT INTO {} ({columns}) VALUES ({})",
                quote_identifier(&table),
                placeholders.join(", ")
            );
            let mut statement =
                tx.prepare(&sql).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            for row in &result.rows {
                let cells = row.cells();
                if cells.len() != names.len() {
                    return Err(SqliteStoreError::Invalid(format!(
                        "row for source {} has {} cells, expected {}",
                        row.source_id,
                        cells.len(),
                        names.len()
                    )));
                }
                statement
                    .execute(params_from_iter(cells.into_iter().map(value_from_cell)))
                    .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            }
            Ok(result.len())
        })?;
        debug!(table = %table, rows = written, "committed xref rows");
        Ok(written)
    }

    /// Runs `operation` inside a transaction on a connection opened for it.
    ///
    /// The store mutex is held from open until the connection is closed.
    fn with_transaction<T>(
        &self,
        operation: impl FnOnce(&Transaction<'_>) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        let guard = self
            .write_lock
            .lock()
            .map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))?;
        let mut connection = open_connection(&self.config)?;
        let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let value = operation(&tx)?;
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        connection.close().map_err(|(_, err)| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        Ok(value)
    }
}

impl ResultSink for SqliteXrefStore {
    fn prepare(
        &self,
        database: &DatabaseName,
        schema: &TableSchema,
        overwrite: bool,
    ) -> Result<(), SinkError> {
        self.prepare_table(database, schema, overwrite).map_err(SinkError::from)
    }

    fn append(&self, table: &ResultTable) -> Result<usize, SinkError> {
        self.append_table(table).map_err(SinkError::from)
    }
}

// ============================================================================//
// SECTION: Helpers
// ============================================================================//

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Rejects table names that are not plain identifiers.
fn validate_table_name(table: &str) -> Result<(), SqliteStoreError> {
    if is_sql_identifier(table) {
        Ok(())
    } else {
        Err(SqliteStoreError::Invalid(format!("invalid table name: {table}")))
    }
}

/// Opens an `SQLite` connection with the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Returns true when `table` exists.
fn table_exists(tx: &Transaction<'_>, table: &str) -> Result<bool, SqliteStoreError> {
    let found: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(found.is_some())
}

/// Returns the column names of `table` in stored order.
fn table_info(tx: &Transaction<'_>, table: &str) -> Result<Vec<String>, SqliteStoreError> {
    let sql = format!("PRAGMA table_info({})", quote_identifier(table));
    let mut statement = tx.prepare(&sql).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let columns = statement
        .query_map(params![], |row| row.get::<_, String>(1))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?
        .collect::<Result<Vec<String>, rusqlite::Error>>()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(columns)
}

/// Creates `table` with the canonical schema.
fn create_table(
    tx: &Transaction<'_>,
    table: &str,
    schema: &TableSchema,
) -> Result<(), SqliteStoreError> {
    if schema.columns.is_empty() {
        return Err(SqliteStoreError::Invalid(format!("empty schema for {table}")));
    }
    let mut definitions = Vec::with_capacity(schema.columns.len());
    for column in &schema.columns {
        if !is_sql_identifier(&column.name) {
            return Err(SqliteStoreError::Invalid(format!("invalid column name: {}", column.name)));
        }
        definitions.push(format!("{} {}", quote_identifier(&column.name), column.kind.sql_type()));
    }
    tx.execute_batch(&format!(
        "CREATE TABLE {} ({});",
        quote_identifier(table),
        definitions.join(", ")
    ))
    .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    info!(table = %table, columns = schema.columns.len(), "created xref table");
    Ok(())
}

/// Quotes an identifier for inclusion in SQL text.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Converts a cell into an `SQLite` value.
fn value_from_cell(cell: CellValue) -> Value {
    match cell {
        CellValue::Null => Value::Null,
        CellValue::Integer(value) => Value::Integer(value),
        CellValue::Real(value) => Value::Real(value),
        CellValue::Text(value) => Value::Text(value),
    }
}

/// Converts an `SQLite` value into a cell.
fn cell_from_value(value: Value) -> CellValue {
    match value {
        Value::Null | Value::Blob(_) => CellValue::Null,
        Value::Integer(value) => CellValue::Integer(value),
        Value::Real(value) => CellValue::Real(value),
        Value::Text(value) => CellValue::Text(value),
    }
}
