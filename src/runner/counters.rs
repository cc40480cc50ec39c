use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Lock-free executed/error counters shared by every worker of a run.
///
/// `executed` is always bumped before `errors`, and readers load `errors`
/// first, so an observer never sees more errors than executions.
#[derive(Debug, Default)]
pub(super) struct RunCounters {
    executed: AtomicU64,
    errors: AtomicU64,
}

impl RunCounters {
    /// Only called while no worker is alive.
    pub(super) fn reset(&self) {
        self.errors.store(0, Ordering::SeqCst);
        self.executed.store(0, Ordering::SeqCst);
    }

    pub(super) fn record(&self, success: bool) {
        self.executed.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.errors.fetch_add(1, Ordering::Release);
        }
    }

    pub(super) fn executed(&self) -> u64 {
        self.executed.load(Ordering::Acquire)
    }

    pub(super) fn errors(&self) -> u64 {
        self.errors.load(Ordering::Acquire)
    }

    /// Returns `(executed, errors)` with `executed >= errors`.
    pub(super) fn load_pair(&self) -> (u64, u64) {
        let errors = self.errors();
        let executed = self.executed();
        (executed, errors)
    }
}

/// Point-in-time view of a runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSnapshot {
    pub running: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub elapsed: Duration,
    pub executed: u64,
    pub errors: u64,
    pub active_workers: usize,
}

/// Outcome of a `stop` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopSummary {
    /// Wall-clock length of the run that was stopped.
    pub elapsed: Duration,
    pub executed: u64,
    pub errors: u64,
    /// Workers that exited on their own before the deadline.
    pub joined: usize,
    /// Workers aborted after the graceful timeout.
    pub aborted: usize,
    /// Workers that had already exited because a probe panicked.
    pub faulted: usize,
}
