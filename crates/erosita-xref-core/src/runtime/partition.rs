// crates/erosita-xref-core/src/runtime/partition.rs
// ============================================================================
// Module: Batch Partitioner
// Description: Splits sources and radii into contiguous query groups.
// Purpose: Produce identical group boundaries for parallel input arrays.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Partitioning is done on index ranges first, then the same ranges are
//! applied to every parallel array. That keeps index `i` of radius group `k`
//! aligned with index `i` of source group `k` by construction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ops::Range;

use crate::core::Angle;
use crate::core::SourceRecord;
use crate::runtime::error::XrefError;

// ============================================================================
// SECTION: Ranges
// ============================================================================

/// Splits `len` items into contiguous ranges of at most `group_size`.
///
/// Produces `ceil(len / group_size)` ranges; only the last may be short.
///
/// # Errors
///
/// Returns [`XrefError::InvalidRequest`] when `group_size` is zero.
pub fn partition_ranges(len: usize, group_size: usize) -> Result<Vec<Range<usize>>, XrefError> {
    if group_size == 0 {
        return Err(XrefError::InvalidRequest("group size must be at least 1".to_string()));
    }
    Ok((0 .. len)
        .step_by(group_size)
        .map(|start| start .. start.saturating_add(group_size).min(len))
        .collect())
}

// ============================================================================
// SECTION: Query Groups
// ============================================================================

/// A contiguous batch of sources with their radii, handled by one worker.
#[derive(Debug, Clone, Copy)]
pub struct QueryGroup<'a> {
    /// Position of the group in the partition.
    pub index: usize,
    /// Offset of the first source in the full input.
    pub offset: usize,
    /// Sources in query order.
    pub sources: &'a [SourceRecord],
    /// Radii aligned with `sources`.
    pub radii: &'a [Angle],
}

impl QueryGroup<'_> {
    /// Returns the number of sources in the group.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns true when the group has no sources.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Partitions aligned sources and radii into query groups.
///
/// # Errors
///
/// Returns [`XrefError::ShapeMismatch`] when the slices differ in length and
/// [`XrefError::InvalidRequest`] when `group_size` is zero.
pub fn build_groups<'a>(
    sources: &'a [SourceRecord],
    radii: &'a [Angle],
    group_size: usize,
) -> Result<Vec<QueryGroup<'a>>, XrefError> {
    if sources.len() != radii.len() {
        return Err(XrefError::ShapeMismatch {
            sources: sources.len(),
            radii: radii.len(),
        });
    }
    let ranges = partition_ranges(sources.len(), group_size)?;
    Ok(ranges
        .into_iter()
        .enumerate()
        .map(|(index, range)| QueryGroup {
            index,
            offset: range.start,
            sources: &sources[range.clone()],
            radii: &radii[range],
        })
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::build_groups;
    use super::partition_ranges;
    use crate::core::Angle;
    use crate::core::SourceRecord;
    use crate::runtime::error::XrefError;

    #[test]
    fn zero_items_yield_zero_groups() {
        assert!(partition_ranges(0, 5).unwrap().is_empty());
    }

    #[test]
    fn last_group_is_short() {
        let ranges = partition_ranges(11, 5).unwrap();
        assert_eq!(ranges, vec![0 .. 5, 5 .. 10, 10 .. 11]);
    }

    #[test]
    fn zero_group_size_is_rejected() {
        assert!(matches!(partition_ranges(3, 0), Err(XrefError::InvalidRequest(_))));
    }

    #[test]
    fn groups_keep_radii_aligned() {
        let sources: Vec<SourceRecord> = (0 .. 7)
            .map(|id| SourceRecord {
                id,
                ra: 0.0,
                dec: 0.0,
                extent: 0.0,
                search_radius: Angle::from_arcmin(1.0),
            })
            .collect();
        #[allow(clippy::cast_precision_loss, reason = "Small test ids.")]
        let radii: Vec<Angle> = (0 .. 7).map(|id| Angle::from_arcmin(id as f64)).collect();
        let groups = build_groups(&sources, &radii, 3).unwrap();
        assert_eq!(groups.len(), 3);
        for group in &groups {
            for (source, radius) in group.sources.iter().zip(group.radii) {
                #[allow(clippy::cast_precision_loss, reason = "Small test ids.")]
                let expected = source.id as f64;
                assert!((radius.arcmin() - expected).abs() < 1e-9);
            }
        }
        assert_eq!(groups[2].offset, 6);
        assert_eq!(groups[2].len(), 1);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = build_groups(&[], &[Angle::from_arcmin(1.0)], 2).unwrap_err();
        assert!(matches!(
            err,
            XrefError::ShapeMismatch {
                sources: 0,
                radii: 1
            }
        ));
    }
}
