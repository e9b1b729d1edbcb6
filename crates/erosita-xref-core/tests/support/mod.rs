// crates/erosita-xref-core/tests/support/mod.rs
// ============================================================================
// Module: XREF Test Support
// Description: Scripted remote clients, recording sinks, and fixtures.
// Purpose: Drive dispatch runs deterministically without network access.
// ============================================================================

//! Shared fixtures for core integration tests.

#![allow(dead_code, reason = "Each test binary uses a subset of the helpers.")]

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use erosita_xref_core::Angle;
use erosita_xref_core::CellValue;
use erosita_xref_core::ColumnKind;
use erosita_xref_core::ColumnMapping;
use erosita_xref_core::DatabaseDescriptor;
use erosita_xref_core::DatabaseEntry;
use erosita_xref_core::DatabaseName;
use erosita_xref_core::InMemoryResultSink;
use erosita_xref_core::RemoteCatalogClient;
use erosita_xref_core::RemoteError;
use erosita_xref_core::RemoteTable;
use erosita_xref_core::ResultSink;
use erosita_xref_core::ResultTable;
use erosita_xref_core::SinkError;
use erosita_xref_core::SkyCoord;
use erosita_xref_core::SourceRecord;
use erosita_xref_core::TableSchema;

// ============================================================================
// SECTION: Scripted Client
// ============================================================================

/// A canned reply for one remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Return `n` rows.
    Rows(usize),
    /// Return no table.
    NoMatch,
    /// Fail with a transient timeout.
    Timeout,
    /// Fail with a permanent service error.
    Service,
    /// Return a table that lacks the mapped columns.
    Malformed,
}

/// Remote client replaying scripted replies keyed by source id.
///
/// Sources are identified by their right ascension, which the fixtures set
/// to the source id.
pub struct ScriptedClient {
    /// Reply used once a source's script is exhausted.
    fallback: Reply,
    /// Per-source reply queues.
    scripts: Mutex<BTreeMap<i64, VecDeque<Reply>>>,
    /// Calls observed per source.
    calls: Mutex<BTreeMap<i64, usize>>,
    /// Total calls observed.
    total: AtomicUsize,
}

impl ScriptedClient {
    /// Creates a client answering every call with `fallback`.
    pub fn new(fallback: Reply) -> Self {
        Self {
            fallback,
            scripts: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(BTreeMap::new()),
            total: AtomicUsize::new(0),
        }
    }

    /// Queues replies for `source_id` ahead of the fallback.
    pub fn script(self, source_id: i64, replies: &[Reply]) -> Self {
        self.scripts.lock().unwrap().insert(source_id, replies.iter().copied().collect());
        self
    }

    /// Returns how many calls `source_id` received.
    pub fn calls_for(&self, source_id: i64) -> usize {
        self.calls.lock().unwrap().get(&source_id).copied().unwrap_or(0)
    }

    /// Returns the total number of calls.
    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

impl RemoteCatalogClient for ScriptedClient {
    fn search(&self, center: SkyCoord, _radius: Angle) -> Result<Option<RemoteTable>, RemoteError> {
        #[allow(clippy::cast_possible_truncation, reason = "Fixture ids are small integers.")]
        let source_id = center.ra_deg.round() as i64;
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().unwrap().entry(source_id).or_insert(0) += 1;
        let reply = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&source_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or(self.fallback);
        match reply {
            Reply::Rows(count) => Ok(Some(remote_rows(source_id, center, count))),
            Reply::NoMatch => Ok(None),
            Reply::Timeout => Err(RemoteError::Timeout(format!("source {source_id} timed out"))),
            Reply::Service => Err(RemoteError::Service(format!("source {source_id} rejected"))),
            Reply::Malformed => Ok(Some(RemoteTable::new(
                vec!["unexpected".to_string()],
                vec![vec![CellValue::Integer(1)]],
            ))),
        }
    }
}

/// Builds a remote table with `count` rows in the service's own casing.
pub fn remote_rows(source_id: i64, center: SkyCoord, count: usize) -> RemoteTable {
    let rows = (0 .. count)
        .map(|index| {
            vec![
                CellValue::Text(format!("obj-{source_id}-{index}")),
                CellValue::Real(center.ra_deg),
                CellValue::Real(center.dec_deg),
            ]
        })
        .collect();
    RemoteTable::new(vec!["MAIN_ID".to_string(), "RA".to_string(), "DEC".to_string()], rows)
}

// ============================================================================
// SECTION: Recording Sink
// ============================================================================

/// Sink wrapper counting calls and optionally failing chosen appends.
#[derive(Default)]
pub struct RecordingSink {
    /// Underlying storage.
    pub inner: InMemoryResultSink,
    /// Number of `prepare` calls.
    pub prepares: AtomicUsize,
    /// Number of `append` calls.
    pub appends: AtomicUsize,
    /// Append call numbers (1-based) that fail.
    pub fail_appends: Vec<usize>,
}

impl RecordingSink {
    /// Creates a sink that fails the listed append calls.
    pub fn failing(fail_appends: Vec<usize>) -> Self {
        Self {
            fail_appends,
            ..Self::default()
        }
    }

    /// Returns the stored rows of `database`.
    pub fn rows(&self, database: &str) -> Vec<Vec<CellValue>> {
        self.inner
            .table(&DatabaseName::new(database).table_name())
            .unwrap()
            .map(|table| table.rows)
            .unwrap_or_default()
    }

    /// Returns the stored column names of `database`.
    pub fn columns(&self, database: &str) -> Vec<String> {
        self.inner
            .table(&DatabaseName::new(database).table_name())
            .unwrap()
            .map(|table| table.columns)
            .unwrap_or_default()
    }

    /// Returns the distinct `SOURCE_ID` values stored for `database`.
    pub fn source_ids(&self, database: &str) -> Vec<i64> {
        let columns = self.columns(database);
        let Some(index) = columns.iter().position(|column| column == "SOURCE_ID") else {
            return Vec::new();
        };
        let mut ids: Vec<i64> = self
            .rows(database)
            .iter()
            .filter_map(|row| match row.get(index) {
                Some(CellValue::Integer(id)) => Some(*id),
                _ => None,
            })
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

impl ResultSink for RecordingSink {
    fn prepare(
        &self,
        database: &DatabaseName,
        schema: &TableSchema,
        overwrite: bool,
    ) -> Result<(), SinkError> {
        self.prepares.fetch_add(1, Ordering::SeqCst);
        self.inner.prepare(database, schema, overwrite)
    }

    fn append(&self, table: &ResultTable) -> Result<usize, SinkError> {
        let call = self.appends.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_appends.contains(&call) {
            return Err(SinkError::Db(format!("injected failure on append {call}")));
        }
        self.inner.append(table)
    }
}

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Column mapping used by the fixture databases.
pub fn fixture_columns() -> Vec<ColumnMapping> {
    vec![
        ColumnMapping::new("main_id", "MAIN_ID", ColumnKind::Text),
        ColumnMapping::new("ra", "RA", ColumnKind::Real),
        ColumnMapping::new("dec", "DEC", ColumnKind::Real),
    ]
}

/// Builds a descriptor with a fast call rate.
pub fn descriptor(name: &str, max_threads: usize, retries: u32) -> DatabaseDescriptor {
    DatabaseDescriptor {
        name: DatabaseName::new(name),
        max_call_rate: 1_000.0,
        max_threads,
        retries,
        column_mapping: fixture_columns(),
    }
}

/// Builds a registry entry around a scripted client.
pub fn entry(descriptor: DatabaseDescriptor, client: Arc<ScriptedClient>) -> DatabaseEntry {
    DatabaseEntry::new(descriptor, client)
}

/// Builds `count` sources with ids `1..=count`; ra equals the id.
pub fn sources(count: i64) -> Vec<SourceRecord> {
    (1 ..= count)
        .map(|id| {
            #[allow(clippy::cast_precision_loss, reason = "Fixture ids are small integers.")]
            let ra = id as f64;
            SourceRecord {
                id,
                ra,
                dec: -10.0,
                extent: 2.5,
                search_radius: Angle::from_arcmin(1.5),
            }
        })
        .collect()
}

/// Returns one radius per source.
pub fn radii(sources: &[SourceRecord]) -> Vec<Angle> {
    erosita_xref_core::search_radii(sources)
}
