//! Per-worker throttling math.
//!
//! The aggregate target rate is split evenly across the worker pool captured at
//! start. Each worker then paces itself to one probe per interval, sleeping
//! whatever the probe did not already spend. A probe slower than its interval
//! is never sped up, so the realised rate can undershoot the target.

use std::time::Duration;

use super::settings::is_limited;

/// Interval a single worker should spend per iteration.
///
/// Zero means "do not sleep".
pub(super) fn worker_interval(target_rate: f64, pool_size: usize) -> Duration {
    if !is_limited(target_rate) || pool_size == 0 {
        return Duration::ZERO;
    }
    let per_worker_rate = target_rate / pool_size as f64;
    // Overflow only happens for vanishingly small rates.
    Duration::try_from_secs_f64(per_worker_rate.recip()).unwrap_or(Duration::MAX)
}

/// Sleep left after a probe that took `elapsed`, if any.
pub(super) fn remaining_sleep(interval: Duration, elapsed: Duration) -> Option<Duration> {
    let remaining = interval.saturating_sub(elapsed);
    if remaining.is_zero() {
        None
    } else {
        Some(remaining)
    }
}
