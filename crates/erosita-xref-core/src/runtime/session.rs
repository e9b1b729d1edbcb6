// crates/erosita-xref-core/src/runtime/session.rs
// ============================================================================
// Module: XREF Session
// Description: Multi-database cross-reference driver.
// Purpose: Run pre-flight checks and one coordinator phase per database.
// Dependencies: crate::{core, interfaces, runtime}, tracing
// ============================================================================

//! ## Overview
//! An [`XrefSession`] pairs a [`DatabaseRegistry`] with a [`QueryCoordinator`].
//! Each database phase runs its pre-flight checks in a fixed order before any
//! thread is spawned or the store is touched beyond preparation:
//!
//! 1. registry lookup (`UnknownDatabase`), ignoring ASCII case
//! 2. input shape (`ShapeMismatch`), after broadcasting a single radius
//! 3. run options (`InvalidRequest`)
//! 4. store preparation (`TableExists` unless overwrite is set)
//!
//! A failed phase does not stop later databases in
//! [`XrefSession::cross_reference`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::borrow::Cow;

use serde::Deserialize;
use serde::Serialize;
use tracing::error;
use tracing::warn;

use crate::core::Angle;
use crate::core::SourceRecord;
use crate::core::TableSchema;
use crate::runtime::coordinator::QueryCoordinator;
use crate::runtime::coordinator::RunSummary;
use crate::runtime::error::XrefError;
use crate::runtime::registry::DatabaseRegistry;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Default number of sources per query group.
pub const DEFAULT_GROUP_SIZE: usize = 20;
/// Default requested worker count.
pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Per-run dispatch options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct XrefOptions {
    /// Sources per query group.
    pub group_size: usize,
    /// Requested worker count before the per-database cap.
    pub max_workers: usize,
    /// Replace existing tables instead of failing.
    pub overwrite: bool,
}

impl Default for XrefOptions {
    fn default() -> Self {
        Self {
            group_size: DEFAULT_GROUP_SIZE,
            max_workers: DEFAULT_MAX_WORKERS,
            overwrite: false,
        }
    }
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Outcome of one database phase.
#[derive(Debug)]
pub struct DatabasePhase {
    /// Database name as requested.
    pub database: String,
    /// Run summary, or the error that aborted the phase.
    pub result: Result<RunSummary, XrefError>,
}

/// Outcome of a multi-database cross-reference.
#[derive(Debug, Default)]
pub struct XrefReport {
    /// Phases in request order.
    pub phases: Vec<DatabasePhase>,
}

impl XrefReport {
    /// Returns the number of failed sources across completed phases.
    #[must_use]
    pub fn total_errors(&self) -> usize {
        self.phases
            .iter()
            .filter_map(|phase| phase.result.as_ref().ok())
            .map(|summary| summary.error_count)
            .sum()
    }

    /// Returns the number of phases that aborted before dispatch.
    #[must_use]
    pub fn aborted_phases(&self) -> usize {
        self.phases.iter().filter(|phase| phase.result.is_err()).count()
    }
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// Registry plus coordinator for cross-reference runs.
#[derive(Clone)]
pub struct XrefSession {
    /// Known reference databases.
    registry: DatabaseRegistry,
    /// Pool owner and result sink.
    coordinator: QueryCoordinator,
}

impl XrefSession {
    /// Creates a session.
    #[must_use]
    pub const fn new(registry: DatabaseRegistry, coordinator: QueryCoordinator) -> Self {
        Self {
            registry,
            coordinator,
        }
    }

    /// Returns the database registry.
    #[must_use]
    pub const fn registry(&self) -> &DatabaseRegistry {
        &self.registry
    }

    /// Runs one database phase.
    ///
    /// A single radius is applied to every source.
    ///
    /// # Errors
    ///
    /// Returns [`XrefError::UnknownDatabase`], [`XrefError::ShapeMismatch`],
    /// [`XrefError::InvalidRequest`], [`XrefError::TableExists`], or any
    /// error from [`QueryCoordinator::run`]. Option checks run before the
    /// sink is prepared, so a rejected run leaves stored tables untouched.
    pub fn run_database(
        &self,
        database: &str,
        sources: &[SourceRecord],
        radii: &[Angle],
        options: XrefOptions,
    ) -> Result<RunSummary, XrefError> {
        let entry = self.registry.lookup(database)?;
        let radii = broadcast_radii(sources.len(), radii)?;
        QueryCoordinator::validate_request(
            entry,
            sources.len(),
            radii.len(),
            options.max_workers,
            options.group_size,
        )?;
        let schema = TableSchema::for_descriptor(&entry.descriptor);
        self.coordinator.sink().prepare(entry.name(), &schema, options.overwrite)?;
        self.coordinator.run(entry, sources, &radii, options.max_workers, options.group_size)
    }

    /// Runs every requested database in order.
    ///
    /// Phase errors are recorded in the report and never stop later phases.
    #[must_use]
    pub fn cross_reference(
        &self,
        databases: &[&str],
        sources: &[SourceRecord],
        radii: &[Angle],
        options: XrefOptions,
    ) -> XrefReport {
        let mut report = XrefReport::default();
        for database in databases {
            let result = self.run_database(database, sources, radii, options);
            match &result {
                Ok(summary) if summary.error_count > 0 => {
                    warn!(
                        database = %database,
                        errors = summary.error_count,
                        "cross-match finished with failed sources"
                    );
                }
                Ok(_) => {}
                Err(err) => error!(database = %database, error = %err, "cross-match phase aborted"),
            }
            report.phases.push(DatabasePhase {
                database: (*database).to_string(),
                result,
            });
        }
        report
    }
}

/// Expands a single radius to every source; other lengths must match exactly.
///
/// # Errors
///
/// Returns [`XrefError::ShapeMismatch`] when the lengths cannot be aligned.
pub fn broadcast_radii(sources: usize, radii: &[Angle]) -> Result<Cow<'_, [Angle]>, XrefError> {
    match radii {
        [radius] if sources != 1 => Ok(Cow::Owned(vec![*radius; sources])),
        _ if radii.len() == sources => Ok(Cow::Borrowed(radii)),
        _ => Err(XrefError::ShapeMismatch {
            sources,
            radii: radii.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::broadcast_radii;
    use crate::core::Angle;
    use crate::runtime::error::XrefError;

    #[test]
    fn single_radius_is_broadcast() {
        let binding = [Angle::from_arcmin(2.0)];
        let radii = broadcast_radii(4, &binding).unwrap();
        assert_eq!(radii.len(), 4);
    }

    #[test]
    fn mismatched_radii_are_rejected() {
        let binding = [Angle::from_arcmin(1.0), Angle::from_arcmin(2.0)];
        let err = broadcast_radii(3, &binding);
        assert!(matches!(err, Err(XrefError::ShapeMismatch { sources: 3, radii: 2 })));
    }
}
