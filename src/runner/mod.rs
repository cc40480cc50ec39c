//! Worker-pool runner.
//!
//! A [`Runner`] owns a registry of probes and, while running, a fixed pool of
//! Tokio worker tasks. Each worker repeatedly draws a random probe, executes it,
//! records the outcome in lock-free counters and sleeps just long enough to keep
//! the aggregate rate under the configured target.
//!
//! Lifecycle state (`running`, start time, parallelism, worker handles) lives
//! behind one mutex with short critical sections. The hot loop never touches
//! that mutex: the target rate is an atomic and termination is signalled with a
//! per-run [`CancellationToken`].
mod counters;
mod pacing;
mod probe;
mod registry;
mod settings;
mod worker;


use std::future::Future;
use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::RunnerError;

pub use counters::{RunSnapshot, StopSummary};
pub use probe::{FaultPolicy, Probe, ProbeOutcome};
pub use settings::{
    DEFAULT_GRACEFUL_TIMEOUT, DEFAULT_PARALLEL_TESTS, RunnerConfig, UNLIMITED_RATE,
};

use counters::RunCounters;
use registry::ProbeRegistry;
use settings::TargetRate;
use worker::{ActiveGuard, WorkerContext, WorkerExit, run_worker};

/// How long to wait for an aborted worker task to actually unwind.
const ABORT_JOIN_TIMEOUT: Duration = Duration::from_millis(250);

/// Start time captured both as wall clock (for display) and monotonic clock
/// (for elapsed-time math).
#[derive(Debug, Clone, Copy)]
struct RunClock {
    wall: DateTime<Utc>,
    started: Instant,
}

impl RunClock {
    fn now() -> Self {
        Self {
            wall: Utc::now(),
            started: Instant::now(),
        }
    }
}

#[derive(Debug)]
struct RunState {
    running: bool,
    stopping: bool,
    parallelism: usize,
    fault_policy: FaultPolicy,
    clock: Option<RunClock>,
    cancel: Option<CancellationToken>,
    workers: Vec<JoinHandle<WorkerExit>>,
}

/// Concurrent probe runner with an adaptive rate limiter.
///
/// `Runner` is `Send + Sync`; share it behind an `Arc` to observe counters from
/// one task while another controls the lifecycle.
///
/// ```no_run
/// # async fn demo() -> Result<(), probe_runner::error::RunnerError> {
/// use std::time::Duration;
/// use probe_runner::Runner;
///
/// let runner = Runner::new();
/// runner.set_parallel_tests(4);
/// runner.set_target_tests_per_second(100.0);
/// runner.add_test(|| true);
/// runner.start()?;
/// tokio::time::sleep(Duration::from_secs(1)).await;
/// let summary = runner.stop_default().await;
/// println!("{} tests, {} errors", summary.executed, summary.errors);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Runner {
    registry: Arc<ProbeRegistry>,
    counters: Arc<RunCounters>,
    target_rate: Arc<TargetRate>,
    active: Arc<AtomicUsize>,
    state: Arc<Mutex<RunState>>,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// Empty runner: no probes, [`DEFAULT_PARALLEL_TESTS`] workers, unlimited rate.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Empty runner using the given parallelism, rate and fault policy.
    #[must_use]
    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            registry: Arc::new(ProbeRegistry::default()),
            counters: Arc::new(RunCounters::default()),
            target_rate: Arc::new(TargetRate::new(config.target_tests_per_second)),
            active: Arc::new(AtomicUsize::new(0)),
            state: Arc::new(Mutex::new(RunState {
                running: false,
                stopping: false,
                parallelism: config.parallel_tests,
                fault_policy: config.fault_policy,
                clock: None,
                cancel: None,
                workers: Vec::new(),
            })),
        }
    }

    /// Registers a blocking probe. Safe to call while running; workers see it
    /// on their next draw.
    pub fn add_test<F>(&self, probe: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.add_probe(Probe::blocking(probe));
    }

    /// Registers an async probe. The token it receives is cancelled by `stop`.
    pub fn add_async_test<F, Fut>(&self, probe: F)
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.add_probe(Probe::from_async(probe));
    }

    /// Registers an already built [`Probe`].
    pub fn add_probe(&self, probe: Probe) {
        self.registry.push(probe);
    }

    /// Resets the counters and spawns `parallel_tests` workers on the current
    /// Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::AlreadyRunning`] if a run is active,
    /// [`RunnerError::Stopping`] while a previous `stop` is still draining
    /// workers, and [`RunnerError::NoRuntime`] outside a Tokio runtime. The
    /// runner is left untouched in every error case.
    pub fn start(&self) -> Result<(), RunnerError> {
        let runtime = Handle::try_current().map_err(|source| RunnerError::NoRuntime { source })?;
        let mut state = self.lock_state();
        if state.running {
            return Err(RunnerError::AlreadyRunning);
        }
        if state.stopping {
            return Err(RunnerError::Stopping);
        }

        let pool_size = state.parallelism;
        let cancel = CancellationToken::new();
        self.counters.reset();
        state.clock = Some(RunClock::now());
        state.running = true;
        state.workers = (0..pool_size)
            .map(|id| {
                let ctx = WorkerContext {
                    id,
                    pool_size,
                    registry: Arc::clone(&self.registry),
                    counters: Arc::clone(&self.counters),
                    target_rate: Arc::clone(&self.target_rate),
                    fault_policy: state.fault_policy,
                    cancel: cancel.clone(),
                    active: ActiveGuard::enter(&self.active),
                };
                runtime.spawn(run_worker(ctx))
            })
            .collect();
        state.cancel = Some(cancel);

        info!(
            workers = pool_size,
            probes = self.registry.len(),
            target_rate = self.target_rate.load(),
            fault_policy = %state.fault_policy,
            "Runner started."
        );
        Ok(())
    }

    /// [`stop`](Self::stop) with [`DEFAULT_GRACEFUL_TIMEOUT`].
    pub async fn stop_default(&self) -> StopSummary {
        self.stop(DEFAULT_GRACEFUL_TIMEOUT).await
    }

    /// Signals every worker to finish its current probe and exit, waiting up
    /// to `graceful_timeout` overall. Workers still busy at the deadline are
    /// aborted; a blocking probe they were waiting on keeps running on the
    /// blocking pool until it returns, and its result is dropped.
    ///
    /// Stopping an idle runner is a no-op and returns an empty summary. If the
    /// returned future is dropped before it completes, the workers not yet
    /// joined are aborted and `start` keeps failing with
    /// [`RunnerError::Stopping`] until all of them are gone.
    pub async fn stop(&self, graceful_timeout: Duration) -> StopSummary {
        let (cancel, workers, clock) = {
            let mut state = self.lock_state();
            if !state.running {
                return StopSummary::default();
            }
            state.running = false;
            state.stopping = true;
            (
                state.cancel.take(),
                mem::take(&mut state.workers),
                state.clock.take(),
            )
        };

        let mut pending = PendingWorkers {
            state: Arc::clone(&self.state),
            handles: workers.into_iter().map(Some).collect(),
        };
        if let Some(cancel) = cancel {
            cancel.cancel();
        }
        debug!(workers = pending.handles.len(), "Waiting for workers to exit.");

        let deadline = Instant::now().checked_add(graceful_timeout);
        let mut summary = StopSummary::default();
        for slot in &mut pending.handles {
            let Some(handle) = slot.as_mut() else {
                continue;
            };
            let joined = match deadline {
                Some(deadline) => timeout_at(deadline, &mut *handle).await,
                None => Ok((&mut *handle).await),
            };
            match joined {
                Ok(Ok(WorkerExit::Cancelled)) => {
                    summary.joined = summary.joined.saturating_add(1);
                }
                Ok(Ok(WorkerExit::Faulted)) => {
                    summary.joined = summary.joined.saturating_add(1);
                    summary.faulted = summary.faulted.saturating_add(1);
                }
                Ok(Err(err)) => {
                    warn!(error = %err, "Worker task ended abnormally.");
                    summary.joined = summary.joined.saturating_add(1);
                }
                Err(_elapsed) => {
                    handle.abort();
                    summary.aborted = summary.aborted.saturating_add(1);
                    if timeout(ABORT_JOIN_TIMEOUT, &mut *handle).await.is_err() {
                        warn!("Aborted worker did not unwind promptly; abandoning it.");
                    }
                }
            }
            *slot = None;
        }
        drop(pending);

        let (executed, errors) = self.counters.load_pair();
        summary.executed = executed;
        summary.errors = errors;
        summary.elapsed = clock.map_or(Duration::ZERO, |clock| clock.started.elapsed());

        if summary.aborted > 0 {
            warn!(
                aborted = summary.aborted,
                timeout_ms = graceful_timeout.as_millis(),
                "Workers did not exit within the graceful timeout."
            );
        }
        info!(
            executed = summary.executed,
            errors = summary.errors,
            elapsed_ms = summary.elapsed.as_millis(),
            "Runner stopped."
        );
        summary
    }

    /// True between a successful `start` and the matching `stop`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lock_state().running
    }

    /// Wall-clock time of the current run's start; `None` when not running.
    #[must_use]
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.lock_state().clock.map(|clock| clock.wall)
    }

    /// Probes executed since the last `start`.
    #[must_use]
    pub fn total_tests_executed(&self) -> u64 {
        self.counters.executed()
    }

    /// Probes that failed since the last `start`; never above the executed count.
    #[must_use]
    pub fn total_errors(&self) -> u64 {
        self.counters.errors()
    }

    /// Seconds since the current run started, `0.0` when not running.
    #[must_use]
    pub fn total_seconds(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// Time since the current run started, zero when not running.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.lock_state()
            .clock
            .map_or(Duration::ZERO, |clock| clock.started.elapsed())
    }

    /// Worker tasks currently alive. Drops below `parallel_tests` only when
    /// workers exit under [`FaultPolicy::StopWorker`].
    #[must_use]
    pub fn active_workers(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Number of registered probes.
    #[must_use]
    pub fn probe_count(&self) -> usize {
        self.registry.len()
    }

    /// Worker count the next `start` will spawn.
    #[must_use]
    pub fn parallel_tests(&self) -> usize {
        self.lock_state().parallelism
    }

    /// Takes effect at the next `start`.
    pub fn set_parallel_tests(&self, parallel_tests: usize) {
        self.lock_state().parallelism = parallel_tests;
    }

    /// Current aggregate rate ceiling; zero or below means unlimited.
    #[must_use]
    pub fn target_tests_per_second(&self) -> f64 {
        self.target_rate.load()
    }

    /// Zero, negative or non-finite values disable throttling. Running workers
    /// pick the new value up before their next probe.
    pub fn set_target_tests_per_second(&self, rate: f64) {
        self.target_rate.store(rate);
    }

    /// Policy the next `start` hands to its workers.
    #[must_use]
    pub fn fault_policy(&self) -> FaultPolicy {
        self.lock_state().fault_policy
    }

    /// Takes effect at the next `start`.
    pub fn set_fault_policy(&self, policy: FaultPolicy) {
        self.lock_state().fault_policy = policy;
    }

    /// Running flag, start time, elapsed time, counters and live workers in one read.
    #[must_use]
    pub fn snapshot(&self) -> RunSnapshot {
        let (running, clock) = {
            let state = self.lock_state();
            (state.running, state.clock)
        };
        let (executed, errors) = self.counters.load_pair();
        RunSnapshot {
            running,
            start_time: clock.map(|clock| clock.wall),
            elapsed: clock.map_or(Duration::ZERO, |clock| clock.started.elapsed()),
            executed,
            errors,
            active_workers: self.active_workers(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RunState> {
        lock_run_state(&self.state)
    }
}

fn lock_run_state(state: &Mutex<RunState>) -> MutexGuard<'_, RunState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Worker handles a `stop` call has not finished with yet.
///
/// Dropping it clears the `stopping` flag. Handles still present at that point
/// belong to a cancelled `stop`: they are aborted and the flag is only cleared
/// once every one of them has ended, so a new run never shares counters or the
/// live-worker count with tasks from the old one.
struct PendingWorkers {
    state: Arc<Mutex<RunState>>,
    handles: Vec<Option<JoinHandle<WorkerExit>>>,
}

impl Drop for PendingWorkers {
    fn drop(&mut self) {
        let leftover: Vec<JoinHandle<WorkerExit>> = self.handles.drain(..).flatten().collect();
        if leftover.is_empty() {
            lock_run_state(&self.state).stopping = false;
            return;
        }

        warn!(
            workers = leftover.len(),
            "Stop was cancelled; aborting the remaining workers."
        );
        for handle in &leftover {
            handle.abort();
        }
        match Handle::try_current() {
            Ok(runtime) => {
                let state = Arc::clone(&self.state);
                drop(runtime.spawn(async move {
                    for handle in leftover {
                        drop(handle.await);
                    }
                    lock_run_state(&state).stopping = false;
                }));
            }
            Err(_no_runtime) => {
                lock_run_state(&self.state).stopping = false;
            }
        }
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        let mut state = lock_run_state(&self.state);
        if let Some(cancel) = state.cancel.take() {
            cancel.cancel();
        }
        for handle in state.workers.drain(..) {
            handle.abort();
        }
    }
}
