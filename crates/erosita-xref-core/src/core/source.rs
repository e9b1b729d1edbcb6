// crates/erosita-xref-core/src/core/source.rs
// ============================================================================
// Module: Source Records
// Description: Primary-catalog sources consumed by the dispatch engine.
// Purpose: Define the read-only input record for cone searches.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`SourceRecord`] is one X-ray source from the primary catalog. Records are
//! produced by catalog ingestion and only ever read by the engine.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::sky::Angle;
use crate::core::sky::SkyCoord;

// ============================================================================
// SECTION: Source Record
// ============================================================================

/// One primary-catalog source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Catalog-unique source identifier.
    pub id: i64,
    /// Right ascension in degrees.
    pub ra: f64,
    /// Declination in degrees.
    pub dec: f64,
    /// Source extent (arcseconds).
    pub extent: f64,
    /// Cone-search radius for this source.
    pub search_radius: Angle,
}

impl SourceRecord {
    /// Returns the sky position of the source.
    #[must_use]
    pub const fn coord(&self) -> SkyCoord {
        SkyCoord::new(self.ra, self.dec)
    }
}

/// Returns the per-source search radii of `sources`, in order.
#[must_use]
pub fn search_radii(sources: &[SourceRecord]) -> Vec<Angle> {
    sources.iter().map(|source| source.search_radius).collect()
}
