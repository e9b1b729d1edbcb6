// crates/erosita-xref-providers/src/tap.rs
// ============================================================================
// Module: TAP Catalog Client
// Description: ADQL cone searches against synchronous TAP endpoints.
// Purpose: Query NED/SIMBAD and classify transient versus permanent failures.
// Dependencies: erosita-xref-core, reqwest, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! Each search is a single blocking `GET` against `<endpoint>` with
//! `REQUEST=doQuery`, `LANG=ADQL`, `FORMAT=json`, and an ADQL query of the form
//! `SELECT .. FROM <table> WHERE CONTAINS(POINT(..), CIRCLE(..)) = 1`.
//!
//! Failure classification:
//! - request timeouts, connection failures, and HTTP 408/429/502/503/504 are
//!   [`RemoteError::Timeout`] and will be retried by the worker;
//! - other non-success statuses and oversized bodies are
//!   [`RemoteError::Service`];
//! - undecodable bodies are [`RemoteError::Parse`].
//!
//! An empty `data` array is reported as no match.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use erosita_xref_core::Angle;
use erosita_xref_core::CellValue;
use erosita_xref_core::RemoteCatalogClient;
use erosita_xref_core::RemoteError;
use erosita_xref_core::RemoteTable;
use erosita_xref_core::SkyCoord;
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Default maximum response size in bytes.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

/// Configuration for a TAP cone-search client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapClientConfig {
    /// Synchronous TAP endpoint (for example `.../tap/sync`).
    pub endpoint: String,
    /// Table queried by the cone search.
    pub table: String,
    /// Right ascension column of `table`.
    pub ra_column: String,
    /// Declination column of `table`.
    pub dec_column: String,
    /// Columns selected from `table`; empty selects all.
    pub select_columns: Vec<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size in bytes.
    pub max_response_bytes: usize,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl TapClientConfig {
    /// Creates a config with default limits.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            table: table.into(),
            ra_column: "ra".to_string(),
            dec_column: "dec".to_string(),
            select_columns: Vec::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            user_agent: format!("erosita-xref/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// TAP client construction errors.
#[derive(Debug, Error)]
pub enum TapClientError {
    /// The configuration is invalid.
    #[error("invalid tap client config: {0}")]
    InvalidConfig(String),
    /// The HTTP client could not be created.
    #[error("tap http client build failed: {0}")]
    Client(String),
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Cone-search client for one TAP service.
#[derive(Debug)]
pub struct TapCatalogClient {
    /// Client configuration.
    config: TapClientConfig,
    /// Parsed endpoint.
    endpoint: Url,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl TapCatalogClient {
    /// Creates a TAP client.
    ///
    /// # Errors
    ///
    /// Returns [`TapClientError`] when the endpoint or ADQL identifiers are
    /// invalid, or the HTTP client cannot be built.
    pub fn new(config: TapClientConfig) -> Result<Self, TapClientError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|err| TapClientError::InvalidConfig(format!("endpoint: {err}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(TapClientError::InvalidConfig(format!(
                "unsupported endpoint scheme: {}",
                endpoint.scheme()
            )));
        }
        validate_adql_identifier(&config.table)?;
        validate_adql_identifier(&config.ra_column)?;
        validate_adql_identifier(&config.dec_column)?;
        for column in &config.select_columns {
            validate_adql_identifier(column)?;
        }
        if config.max_response_bytes == 0 {
            return Err(TapClientError::InvalidConfig(
                "max_response_bytes must be greater than zero".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::limited(3))
            .build()
            .map_err(|err| TapClientError::Client(err.to_string()))?;
        Ok(Self {
            config,
            endpoint,
            client,
        })
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &TapClientConfig {
        &self.config
    }

    /// Builds the request URL for a cone search.
    fn request_url(&self, center: SkyCoord, radius: Angle) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("REQUEST", "doQuery")
            .append_pair("LANG", "ADQL")
            .append_pair("FORMAT", "json")
            .append_pair("QUERY", &cone_search_adql(&self.config, center, radius));
        url
    }
}

impl RemoteCatalogClient for TapCatalogClient {
    fn search(&self, center: SkyCoord, radius: Angle) -> Result<Option<RemoteTable>, RemoteError> {
        let url = self.request_url(center, radius);
        debug!(endpoint = %self.endpoint, center = %center, radius = %radius, "tap cone search");
        let mut response = self.client.get(url).send().map_err(classify_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }
        let body = read_response_limited(&mut response, self.config.max_response_bytes)?;
        parse_tap_json(&body)
    }
}

// ============================================================================
// SECTION: ADQL
// ============================================================================

/// Builds the ADQL cone-search query for `center` and `radius`.
#[must_use]
pub fn cone_search_adql(config: &TapClientConfig, center: SkyCoord, radius: Angle) -> String {
    let columns =
        if config.select_columns.is_empty() { "*".to_string() } else { config.select_columns.join(", ") };
    format!(
        "SELECT {columns} FROM {table} WHERE CONTAINS(POINT('ICRS', {ra_col}, {dec_col}), \
         CIRCLE('ICRS', {ra:.8}, {dec:.8}, {radius:.8})) = 1",
        table = config.table,
        ra_col = config.ra_column,
        dec_col = config.dec_column,
        ra = center.ra_deg,
        dec = center.dec_deg,
        radius = radius.degrees(),
    )
}

/// Accepts dotted identifiers made of ASCII alphanumerics and underscores.
fn validate_adql_identifier(value: &str) -> Result<(), TapClientError> {
    let valid = !value.is_empty()
        && value.split('.').all(|part| {
            !part.is_empty() && part.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        });
    if valid {
        Ok(())
    } else {
        Err(TapClientError::InvalidConfig(format!("invalid adql identifier: {value}")))
    }
}

// ============================================================================
// SECTION: Response Handling
// ============================================================================

/// TAP JSON output document.
#[derive(Debug, Deserialize)]
struct TapJson {
    /// Column descriptions in result order.
    metadata: Vec<TapField>,
    /// Result rows.
    #[serde(default)]
    data: Vec<Vec<Value>>,
}

/// One column description.
#[derive(Debug, Deserialize)]
struct TapField {
    /// Column name.
    name: String,
}

/// Parses a TAP JSON response into a remote table.
///
/// Returns `Ok(None)` when the response has no rows.
///
/// # Errors
///
/// Returns [`RemoteError::Parse`] when the body is not a TAP JSON document or
/// a row width disagrees with the metadata.
pub fn parse_tap_json(body: &[u8]) -> Result<Option<RemoteTable>, RemoteError> {
    let document: TapJson = serde_json::from_slice(body)
        .map_err(|err| RemoteError::Parse(format!("invalid tap json: {err}")))?;
    if document.data.is_empty() {
        return Ok(None);
    }
    let columns: Vec<String> = document.metadata.into_iter().map(|field| field.name).collect();
    let rows = document
        .data
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            if row.len() == columns.len() {
                Ok(row.into_iter().map(cell_from_json).collect())
            } else {
                Err(RemoteError::Parse(format!(
                    "row {index} has {} values, expected {}",
                    row.len(),
                    columns.len()
                )))
            }
        })
        .collect::<Result<Vec<Vec<CellValue>>, RemoteError>>()?;
    Ok(Some(RemoteTable::new(columns, rows)))
}

/// Converts a JSON value into a cell.
fn cell_from_json(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Bool(flag) => CellValue::Integer(i64::from(flag)),
        Value::Number(number) => number
            .as_i64()
            .map(CellValue::Integer)
            .or_else(|| number.as_f64().map(CellValue::Real))
            .unwrap_or(CellValue::Null),
        Value::String(text) => CellValue::Text(text),
        other => CellValue::Text(other.to_string()),
    }
}

/// Maps a transport error onto the remote error taxonomy.
fn classify_transport_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() || err.is_connect() {
        RemoteError::Timeout(err.to_string())
    } else {
        RemoteError::Service(err.to_string())
    }
}

/// Maps a non-success status onto the remote error taxonomy.
fn classify_status(status: StatusCode) -> RemoteError {
    match status {
        StatusCode::REQUEST_TIMEOUT
        | StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => RemoteError::Timeout(format!("tap service busy: {status}")),
        _ => RemoteError::Service(format!("tap service returned {status}")),
    }
}

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(
    response: &mut reqwest::blocking::Response,
    max_bytes: usize,
) -> Result<Vec<u8>, RemoteError> {
    let max_bytes_u64 = u64::try_from(max_bytes)
        .map_err(|_| RemoteError::Service("response size limit exceeds u64".to_string()))?;
    if let Some(expected) = response.content_length()
        && expected > max_bytes_u64
    {
        return Err(RemoteError::Service("tap response exceeds size limit".to_string()));
    }
    let mut buf = Vec::new();
    let mut handle = response.take(max_bytes_u64.saturating_add(1));
    handle.read_to_end(&mut buf).map_err(|err| {
        if err.kind() == std::io::ErrorKind::TimedOut {
            RemoteError::Timeout(format!("tap response read timed out: {err}"))
        } else {
            RemoteError::Service(format!("failed to read tap response: {err}"))
        }
    })?;
    if buf.len() > max_bytes {
        return Err(RemoteError::Service("tap response exceeds size limit".to_string()));
    }
    Ok(buf)
}
