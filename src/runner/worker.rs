use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::task::yield_now;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::counters::RunCounters;
use super::pacing::{remaining_sleep, worker_interval};
use super::probe::{FaultPolicy, ProbeOutcome};
use super::registry::ProbeRegistry;
use super::settings::TargetRate;

/// Poll period while no probe has been registered yet.
const EMPTY_REGISTRY_BACKOFF: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum WorkerExit {
    Cancelled,
    Faulted,
}

pub(super) struct WorkerContext {
    pub id: usize,
    pub pool_size: usize,
    pub registry: Arc<ProbeRegistry>,
    pub counters: Arc<RunCounters>,
    pub target_rate: Arc<TargetRate>,
    pub fault_policy: FaultPolicy,
    pub cancel: CancellationToken,
    pub active: ActiveGuard,
}

/// Keeps the live-worker count honest, including for aborted tasks.
pub(super) struct ActiveGuard {
    counter: Arc<AtomicUsize>,
}

impl ActiveGuard {
    pub(super) fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self {
            counter: Arc::clone(counter),
        }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}

pub(super) async fn run_worker(ctx: WorkerContext) -> WorkerExit {
    let mut rng = StdRng::from_entropy();
    let mut idle_logged = false;

    while !ctx.cancel.is_cancelled() {
        let iteration_start = Instant::now();
        let interval = worker_interval(ctx.target_rate.load(), ctx.pool_size);

        let Some(probe) = ctx.registry.pick(&mut rng) else {
            if !idle_logged {
                debug!(worker = ctx.id, "No probes registered yet, waiting.");
                idle_logged = true;
            }
            if sleep_or_cancelled(&ctx.cancel, EMPTY_REGISTRY_BACKOFF).await {
                break;
            }
            continue;
        };

        match probe.execute(&ctx.cancel).await {
            ProbeOutcome::Passed => ctx.counters.record(true),
            ProbeOutcome::Failed => ctx.counters.record(false),
            ProbeOutcome::Faulted(message) => match ctx.fault_policy {
                FaultPolicy::CountAsFailure => {
                    warn!(
                        worker = ctx.id,
                        panic = %message,
                        "Probe panicked; counted as a failure."
                    );
                    ctx.counters.record(false);
                }
                FaultPolicy::StopWorker => {
                    error!(
                        worker = ctx.id,
                        panic = %message,
                        "Probe panicked; worker exiting."
                    );
                    return WorkerExit::Faulted;
                }
            },
        }

        match remaining_sleep(interval, iteration_start.elapsed()) {
            Some(remaining) => {
                if sleep_or_cancelled(&ctx.cancel, remaining).await {
                    break;
                }
            }
            // An always-ready async probe never suspends the task otherwise.
            None => yield_now().await,
        }
    }

    drop(ctx.active);
    WorkerExit::Cancelled
}

/// Returns true when the run was cancelled before `duration` elapsed.
async fn sleep_or_cancelled(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        () = cancel.cancelled() => true,
        () = sleep(duration) => false,
    }
}
