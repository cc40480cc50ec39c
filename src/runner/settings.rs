use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::probe::FaultPolicy;

/// Worker count used by a freshly constructed runner.
pub const DEFAULT_PARALLEL_TESTS: usize = 20;
/// How long `stop` waits for workers before aborting them.
pub const DEFAULT_GRACEFUL_TIMEOUT: Duration = Duration::from_millis(5_000);
/// Any rate at or below zero disables throttling; this is the canonical one.
pub const UNLIMITED_RATE: f64 = -1.0;

/// Initial settings for a [`Runner`](super::Runner).
///
/// Deserializable so that config files can carry a `[runner]`-shaped block.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub parallel_tests: usize,
    pub target_tests_per_second: f64,
    pub fault_policy: FaultPolicy,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            parallel_tests: DEFAULT_PARALLEL_TESTS,
            target_tests_per_second: UNLIMITED_RATE,
            fault_policy: FaultPolicy::default(),
        }
    }
}

/// Target rate published as raw `f64` bits.
///
/// Workers read this before every probe, so it stays outside the state mutex.
#[derive(Debug)]
pub(super) struct TargetRate(AtomicU64);

impl TargetRate {
    pub(super) fn new(rate: f64) -> Self {
        Self(AtomicU64::new(rate.to_bits()))
    }

    pub(super) fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub(super) fn store(&self, rate: f64) {
        self.0.store(rate.to_bits(), Ordering::Relaxed);
    }
}

/// Returns true when `rate` should throttle workers.
pub(super) fn is_limited(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}
