// crates/erosita-xref-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite XREF Store Tests
// Description: Table creation, schema checks, overwrite, and concurrency.
// Purpose: Validate the SQLite ResultSink against real database files.
// ============================================================================

//! ## Overview
//! Integration tests for [`SqliteXrefStore`].

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::thread;

use erosita_xref_core::Angle;
use erosita_xref_core::CellValue;
use erosita_xref_core::ColumnKind;
use erosita_xref_core::ColumnMapping;
use erosita_xref_core::DatabaseDescriptor;
use erosita_xref_core::DatabaseName;
use erosita_xref_core::MatchRow;
use erosita_xref_core::ResultSink;
use erosita_xref_core::ResultTable;
use erosita_xref_core::SinkError;
use erosita_xref_core::SourceRecord;
use erosita_xref_core::TableSchema;
use erosita_xref_store_sqlite::SOURCE_TABLE;
use erosita_xref_store_sqlite::SqliteStoreConfig;
use erosita_xref_store_sqlite::SqliteStoreMode;
use erosita_xref_store_sqlite::SqliteXrefStore;
use tempfile::TempDir;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn store_in(dir: &TempDir) -> SqliteXrefStore {
    SqliteXrefStore::open(SqliteStoreConfig::new(dir.path().join("xref.db"))).unwrap()
}

fn descriptor(extra: Option<ColumnMapping>) -> DatabaseDescriptor {
    let mut column_mapping = vec![
        ColumnMapping::new("main_id", "MAIN_ID", ColumnKind::Text),
        ColumnMapping::new("ra", "RA", ColumnKind::Real),
        ColumnMapping::new("dec", "DEC", ColumnKind::Real),
    ];
    column_mapping.extend(extra);
    DatabaseDescriptor {
        name: DatabaseName::new("SIMBAD"),
        max_call_rate: 5.0,
        max_threads: 2,
        retries: 1,
        column_mapping,
    }
}

fn result_table(schema: &TableSchema, source_ids: &[i64]) -> ResultTable {
    let mut table = ResultTable::new(DatabaseName::new("SIMBAD"), schema.clone());
    let mapped = schema.columns.len() - 6;
    for id in source_ids {
        let mut values = vec![CellValue::Text(format!("obj-{id}"))];
        values.resize(mapped, CellValue::Real(1.25));
        table.rows.push(MatchRow {
            source_id: *id,
            extent: 3.0,
            source_ra: 150.0,
            source_dec: 2.0,
            search_radius_arcmin: 0.5,
            provenance: DatabaseName::new("SIMBAD"),
            values,
        });
    }
    table
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn first_append_creates_table_with_canonical_schema() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let schema = TableSchema::for_descriptor(&descriptor(None));

    assert_eq!(store.append(&result_table(&schema, &[7, 8])).unwrap(), 2);

    let columns = store.table_columns("XREF_SIMBAD").unwrap().unwrap();
    assert_eq!(columns, schema.column_names());
    let rows = store.read_rows("XREF_SIMBAD").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], CellValue::Text("obj-7".to_string()));
    assert_eq!(rows[0][3], CellValue::Integer(7));
    assert_eq!(rows[1][8], CellValue::Text("SIMBAD".to_string()));
}

#[test]
fn identical_schemas_append_without_mismatch() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let schema = TableSchema::for_descriptor(&descriptor(None));

    store.append(&result_table(&schema, &[1])).unwrap();
    store.append(&result_table(&schema, &[2, 3])).unwrap();

    assert_eq!(store.read_rows("XREF_SIMBAD").unwrap().len(), 3);
}

#[test]
fn different_schema_append_fails() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let schema = TableSchema::for_descriptor(&descriptor(None));
    store.append(&result_table(&schema, &[1])).unwrap();

    let wider = TableSchema::for_descriptor(&descriptor(Some(ColumnMapping::new(
        "otype",
        "OTYPE",
        ColumnKind::Text,
    ))));
    let err = store.append(&result_table(&wider, &[2])).unwrap_err();

    assert!(matches!(err, SinkError::SchemaMismatch { ref table, .. } if table == "XREF_SIMBAD"));
    assert_eq!(store.read_rows("XREF_SIMBAD").unwrap().len(), 1);
}

#[test]
fn empty_tables_are_not_written() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let schema = TableSchema::for_descriptor(&descriptor(None));

    assert_eq!(store.append(&result_table(&schema, &[])).unwrap(), 0);
    assert!(store.table_columns("XREF_SIMBAD").unwrap().is_none());
}

#[test]
fn prepare_requires_overwrite_for_existing_tables() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let descriptor = descriptor(None);
    let schema = TableSchema::for_descriptor(&descriptor);

    store.prepare(&descriptor.name, &schema, false).unwrap();
    store.append(&result_table(&schema, &[1, 2])).unwrap();

    let err = store.prepare(&descriptor.name, &schema, false).unwrap_err();
    assert!(matches!(err, SinkError::TableExists(ref table) if table == "XREF_SIMBAD"));
    assert_eq!(store.read_rows("XREF_SIMBAD").unwrap().len(), 2);

    store.prepare(&descriptor.name, &schema, true).unwrap();
    assert!(store.read_rows("XREF_SIMBAD").unwrap().is_empty());
}

#[test]
fn overwrite_replaces_the_schema() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let narrow = descriptor(None);
    store.prepare(&narrow.name, &TableSchema::for_descriptor(&narrow), false).unwrap();

    let wide = descriptor(Some(ColumnMapping::new("z", "REDSHIFT", ColumnKind::Real)));
    let wide_schema = TableSchema::for_descriptor(&wide);
    store.prepare(&wide.name, &wide_schema, true).unwrap();

    assert_eq!(store.append(&result_table(&wide_schema, &[4])).unwrap(), 1);
    assert_eq!(store.table_columns("XREF_SIMBAD").unwrap().unwrap().len(), 10);
}

#[test]
fn concurrent_appends_are_serialized() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(store_in(&dir));
    let schema = TableSchema::for_descriptor(&descriptor(None));

    let handles: Vec<_> = (0 .. 8_i64)
        .map(|worker| {
            let store = Arc::clone(&store);
            let table = result_table(&schema, &[worker * 10, worker * 10 + 1, worker * 10 + 2]);
            thread::spawn(move || store.append(&table).unwrap())
        })
        .collect();
    let written: usize = handles.into_iter().map(|handle| handle.join().unwrap()).sum();

    assert_eq!(written, 24);
    let rows = store.read_rows("XREF_SIMBAD").unwrap();
    assert_eq!(rows.len(), 24);
    for chunk in rows.chunks(3) {
        let CellValue::Integer(first) = chunk[0][3] else {
            panic!("source id should be an integer");
        };
        assert_eq!(chunk[1][3], CellValue::Integer(first + 1));
        assert_eq!(chunk[2][3], CellValue::Integer(first + 2));
    }
}

#[test]
fn source_table_is_replaced_on_each_export() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let sources: Vec<SourceRecord> = (1 ..= 3)
        .map(|id| SourceRecord {
            id,
            ra: 10.0,
            dec: -5.0,
            extent: 0.0,
            search_radius: Angle::from_arcmin(2.0),
        })
        .collect();

    assert_eq!(store.write_source_table(&sources).unwrap(), 3);
    assert_eq!(store.write_source_table(&sources[.. 1]).unwrap(), 1);

    let rows = store.read_rows(SOURCE_TABLE).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], CellValue::Integer(1));
}

#[test]
fn delete_journal_mode_is_supported() {
    let dir = TempDir::new().unwrap();
    let mut config = SqliteStoreConfig::new(dir.path().join("nested").join("xref.db"));
    config.journal_mode = SqliteStoreMode::Delete;
    let store = SqliteXrefStore::open(config).unwrap();
    let schema = TableSchema::for_descriptor(&descriptor(None));

    store.append(&result_table(&schema, &[1])).unwrap();
    assert!(dir.path().join("nested").join("xref.db").exists());
}

#[test]
fn directory_paths_are_rejected() {
    let dir = TempDir::new().unwrap();
    assert!(SqliteXrefStore::open(SqliteStoreConfig::new(dir.path())).is_err());
}

#[test]
fn invalid_table_names_are_rejected() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    assert!(store.read_rows("XREF_NED; DROP TABLE x").is_err());
}
