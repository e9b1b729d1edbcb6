// crates/erosita-xref-core/src/runtime/progress.rs
// ============================================================================
// Module: Progress Observers
// Description: Built-in progress observers for dispatch runs.
// Purpose: Report sources completed as groups finish.
// Dependencies: crate::{core, interfaces}, tracing
// ============================================================================

//! ## Overview
//! [`LoggingProgress`] emits one `tracing` event per finished group.
//! [`ProgressCounter`] keeps the latest count in memory for callers that
//! drive their own indicator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use tracing::info;

use crate::core::DatabaseName;
use crate::interfaces::ProgressObserver;

// ============================================================================
// SECTION: Observers
// ============================================================================

/// Logs completion counts at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingProgress;

impl ProgressObserver for LoggingProgress {
    fn sources_completed(&self, database: &DatabaseName, completed: usize, total: usize) {
        info!(database = %database, completed, total, "cross-match progress");
    }
}

/// Records the most recent completion count.
#[derive(Debug, Default)]
pub struct ProgressCounter {
    /// Sources completed so far.
    completed: AtomicUsize,
    /// Number of progress callbacks received.
    updates: AtomicUsize,
}

impl ProgressCounter {
    /// Creates a zeroed counter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            completed: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
        }
    }

    /// Returns the last reported completion count.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    /// Returns how many progress callbacks were received.
    #[must_use]
    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::Relaxed)
    }
}

impl ProgressObserver for ProgressCounter {
    fn sources_completed(&self, _database: &DatabaseName, completed: usize, _total: usize) {
        self.completed.fetch_max(completed, Ordering::Relaxed);
        self.updates.fetch_add(1, Ordering::Relaxed);
    }
}
