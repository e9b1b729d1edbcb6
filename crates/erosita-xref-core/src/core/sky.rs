// crates/erosita-xref-core/src/core/sky.rs
// ============================================================================
// Module: Sky Geometry
// Description: Sky positions and angular sizes used by cone searches.
// Purpose: Keep degree/arcminute conversions in one typed place.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`SkyCoord`] is an ICRS position in degrees and [`Angle`] is an angular
//! size stored in degrees. Both are plain `Copy` values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Arcminutes per degree.
const ARCMIN_PER_DEGREE: f64 = 60.0;
/// Arcseconds per degree.
const ARCSEC_PER_DEGREE: f64 = 3_600.0;

// ============================================================================
// SECTION: Sky Coordinate
// ============================================================================

/// ICRS sky position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyCoord {
    /// Right ascension in degrees.
    pub ra_deg: f64,
    /// Declination in degrees.
    pub dec_deg: f64,
}

impl SkyCoord {
    /// Creates a sky coordinate from right ascension and declination.
    #[must_use]
    pub const fn new(ra_deg: f64, dec_deg: f64) -> Self {
        Self {
            ra_deg,
            dec_deg,
        }
    }

    /// Returns true when both components are finite and declination is in range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.ra_deg.is_finite() && self.dec_deg.is_finite() && self.dec_deg.abs() <= 90.0
    }
}

impl fmt::Display for SkyCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:+.6})", self.ra_deg, self.dec_deg)
    }
}

// ============================================================================
// SECTION: Angle
// ============================================================================

/// Angular size, stored in degrees.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Angle {
    /// Angle in degrees.
    degrees: f64,
}

impl Angle {
    /// Creates an angle from degrees.
    #[must_use]
    pub const fn from_degrees(degrees: f64) -> Self {
        Self {
            degrees,
        }
    }

    /// Creates an angle from arcminutes.
    #[must_use]
    pub fn from_arcmin(arcmin: f64) -> Self {
        Self::from_degrees(arcmin / ARCMIN_PER_DEGREE)
    }

    /// Creates an angle from arcseconds.
    #[must_use]
    pub fn from_arcsec(arcsec: f64) -> Self {
        Self::from_degrees(arcsec / ARCSEC_PER_DEGREE)
    }

    /// Returns the angle in degrees.
    #[must_use]
    pub const fn degrees(self) -> f64 {
        self.degrees
    }

    /// Returns the angle in arcminutes.
    #[must_use]
    pub fn arcmin(self) -> f64 {
        self.degrees * ARCMIN_PER_DEGREE
    }

    /// Returns the angle in arcseconds.
    #[must_use]
    pub fn arcsec(self) -> f64 {
        self.degrees * ARCSEC_PER_DEGREE
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} arcmin", self.arcmin())
    }
}
