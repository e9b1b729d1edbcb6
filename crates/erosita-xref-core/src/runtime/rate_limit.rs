// crates/erosita-xref-core/src/runtime/rate_limit.rs
// ============================================================================
// Module: Rate Limiter
// Description: Per-worker call pacing derived from a database call rate.
// Purpose: Bound the aggregate call rate of a worker pool without locking.
// Dependencies: rayon, std::time
// ============================================================================

//! ## Overview
//! A database allows `r` calls per second. A pool of `n` threads shares that
//! budget by having each thread wait `T = n / r` between the starts of its own
//! consecutive calls. Each thread owns a [`CallPacer`] holding the earliest
//! instant its next call may begin, so a thread only sleeps for the part of
//! `T` the previous call did not already consume.
//!
//! There is no cross-thread coordination beyond the shared interval `T`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::sync::PoisonError;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use crate::runtime::error::XrefError;

// ============================================================================
// SECTION: Call Pacer
// ============================================================================

/// Earliest-next-call tracker for a single worker thread.
#[derive(Debug, Clone)]
pub struct CallPacer {
    /// Minimum spacing between call starts.
    interval: Duration,
    /// Earliest instant the next call may start.
    next_call_at: Option<Instant>,
}

impl CallPacer {
    /// Creates a pacer with the given interval.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_call_at: None,
        }
    }

    /// Returns the pacing interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Blocks until the next call may start, then records the call start.
    ///
    /// Returns the time spent waiting.
    pub fn begin_call(&mut self) -> Duration {
        let mut now = Instant::now();
        let mut waited = Duration::ZERO;
        if let Some(deadline) = self.next_call_at
            && deadline > now
        {
            waited = deadline - now;
            thread::sleep(waited);
            now = Instant::now();
        }
        self.next_call_at = now.checked_add(self.interval);
        waited
    }
}

// ============================================================================
// SECTION: Rate Limiter
// ============================================================================

/// Pool-wide rate limiter holding one [`CallPacer`] per worker thread.
#[derive(Debug)]
pub struct RateLimiter {
    /// Interval shared by every pacer.
    interval: Duration,
    /// Pacers indexed by pool thread index.
    pacers: Vec<Mutex<CallPacer>>,
}

impl RateLimiter {
    /// Builds a limiter for `threads` workers sharing `max_call_rate` calls/sec.
    ///
    /// # Errors
    ///
    /// Returns [`XrefError::InvalidRequest`] when the rate is not a positive
    /// finite number, `threads` is zero, or the interval is unrepresentable.
    pub fn for_pool(max_call_rate: f64, threads: usize) -> Result<Self, XrefError> {
        let interval = call_interval(max_call_rate, threads)?;
        let pacers = (0 .. threads).map(|_| Mutex::new(CallPacer::new(interval))).collect();
        Ok(Self {
            interval,
            pacers,
        })
    }

    /// Returns the per-thread call interval `T`.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Paces the calling pool thread and returns the time spent waiting.
    ///
    /// Threads outside the pool share the first pacer.
    pub fn pace(&self) -> Duration {
        let slot = rayon::current_thread_index().unwrap_or(0);
        let Some(pacer) = self.pacers.get(slot % self.pacers.len().max(1)) else {
            return Duration::ZERO;
        };
        let mut guard = pacer.lock().unwrap_or_else(PoisonError::into_inner);
        guard.begin_call()
    }
}

/// Computes `T = threads / max_call_rate`.
///
/// # Errors
///
/// Returns [`XrefError::InvalidRequest`] for non-positive or non-finite rates,
/// zero threads, or intervals that overflow [`Duration`].
pub fn call_interval(max_call_rate: f64, threads: usize) -> Result<Duration, XrefError> {
    if !max_call_rate.is_finite() || max_call_rate <= 0.0 {
        return Err(XrefError::InvalidRequest(format!(
            "max call rate must be positive, got {max_call_rate}"
        )));
    }
    if threads == 0 {
        return Err(XrefError::InvalidRequest("thread count must be at least 1".to_string()));
    }
    #[allow(clippy::cast_precision_loss, reason = "Thread counts are small.")]
    let seconds = threads as f64 / max_call_rate;
    Duration::try_from_secs_f64(seconds)
        .map_err(|err| XrefError::InvalidRequest(format!("invalid call interval: {err}")))
}
