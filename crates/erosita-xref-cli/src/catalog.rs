// crates/erosita-xref-cli/src/catalog.rs
// ============================================================================
// Module: Source Catalog Reader
// Description: JSON-lines ingestion of primary-catalog sources.
// Purpose: Turn a catalog export into validated SourceRecords.
// Dependencies: erosita-xref-core, serde, serde_json
// ============================================================================

//! ## Overview
//! One source per line:
//!
//! ```text
//! {"id": 1, "ra": 150.1, "dec": 2.2, "extent": 4.0, "search_radius_arcmin": 1.5}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. `extent` defaults to
//! zero. Ids must be unique, coordinates valid, and radii positive.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use erosita_xref_core::Angle;
use erosita_xref_core::SourceRecord;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum catalog file size in bytes.
pub const MAX_CATALOG_BYTES: usize = 256 * 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Catalog ingestion errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog could not be read.
    #[error("catalog io error: {0}")]
    Io(String),
    /// The catalog exceeds the size limit.
    #[error("catalog exceeds size limit ({size} > {limit} bytes)")]
    TooLarge {
        /// Observed size in bytes.
        size: u64,
        /// Maximum allowed size in bytes.
        limit: usize,
    },
    /// A line is not a valid source record.
    #[error("catalog line {line}: {message}")]
    Line {
        /// 1-based line number.
        line: usize,
        /// Failure description.
        message: String,
    },
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// One catalog line as written by catalog exports.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogLine {
    /// Source identifier.
    id: i64,
    /// Right ascension in degrees.
    ra: f64,
    /// Declination in degrees.
    dec: f64,
    /// Source extent.
    #[serde(default)]
    extent: f64,
    /// Cone-search radius in arcminutes.
    search_radius_arcmin: f64,
}

/// Reads and parses a JSON-lines catalog from `path`.
///
/// # Errors
///
/// Returns [`CatalogError`] when the file cannot be read, is too large, or a
/// line is invalid.
pub fn read_catalog(path: &Path, max_bytes: usize) -> Result<Vec<SourceRecord>, CatalogError> {
    let file = File::open(path).map_err(|err| CatalogError::Io(err.to_string()))?;
    let size = file.metadata().map_err(|err| CatalogError::Io(err.to_string()))?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(CatalogError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    let mut content = String::new();
    file.take(limit.saturating_add(1))
        .read_to_string(&mut content)
        .map_err(|err| CatalogError::Io(err.to_string()))?;
    if content.len() > max_bytes {
        return Err(CatalogError::TooLarge {
            size: u64::try_from(content.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    parse_catalog(&content)
}

/// Parses JSON-lines catalog content.
///
/// # Errors
///
/// Returns [`CatalogError::Line`] for the first invalid line.
pub fn parse_catalog(content: &str) -> Result<Vec<SourceRecord>, CatalogError> {
    let mut sources = Vec::new();
    let mut ids = BTreeSet::new();
    for (index, raw) in content.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let record: CatalogLine = serde_json::from_str(trimmed).map_err(|err| CatalogError::Line {
            line,
            message: err.to_string(),
        })?;
        let source = to_source(record).map_err(|message| CatalogError::Line {
            line,
            message,
        })?;
        if !ids.insert(source.id) {
            return Err(CatalogError::Line {
                line,
                message: format!("duplicate source id {}", source.id),
            });
        }
        sources.push(source);
    }
    Ok(sources)
}

/// Validates a catalog line and converts it into a source record.
fn to_source(line: CatalogLine) -> Result<SourceRecord, String> {
    let source = SourceRecord {
        id: line.id,
        ra: line.ra,
        dec: line.dec,
        extent: line.extent,
        search_radius: Angle::from_arcmin(line.search_radius_arcmin),
    };
    if !source.coord().is_valid() {
        return Err(format!("invalid coordinates for source {}", line.id));
    }
    if !line.search_radius_arcmin.is_finite() || line.search_radius_arcmin <= 0.0 {
        return Err(format!("search radius must be positive for source {}", line.id));
    }
    if !line.extent.is_finite() {
        return Err(format!("extent must be finite for source {}", line.id));
    }
    Ok(source)
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::CatalogError;
    use super::parse_catalog;

    #[test]
    fn parses_sources_and_skips_comments() {
        let content = "# eRASS1 excerpt\n\
            {\"id\": 7, \"ra\": 150.1, \"dec\": 2.2, \"extent\": 4.0, \"search_radius_arcmin\": 1.5}\n\
            \n\
            {\"id\": 8, \"ra\": 10.0, \"dec\": -5.0, \"search_radius_arcmin\": 0.5}\n";
        let sources = parse_catalog(content).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].id, 7);
        assert!((sources[0].search_radius.arcmin() - 1.5).abs() < 1e-9);
        assert!(sources[1].extent.abs() < f64::EPSILON);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let content = "{\"id\": 1, \"ra\": 1.0, \"dec\": 1.0, \"search_radius_arcmin\": 1.0}\n\
            {\"id\": 1, \"ra\": 2.0, \"dec\": 1.0, \"search_radius_arcmin\": 1.0}";
        assert!(matches!(parse_catalog(content), Err(CatalogError::Line { line: 2, .. })));
    }

    #[test]
    fn invalid_declination_is_rejected() {
        let content = "{\"id\": 1, \"ra\": 1.0, \"dec\": 91.0, \"search_radius_arcmin\": 1.0}";
        assert!(matches!(parse_catalog(content), Err(CatalogError::Line { line: 1, .. })));
    }

    #[test]
    fn non_positive_radius_is_rejected() {
        let content = "{\"id\": 1, \"ra\": 1.0, \"dec\": 1.0, \"search_radius_arcmin\": 0.0}";
        assert!(parse_catalog(content).is_err());
    }
}
