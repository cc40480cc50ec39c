//! Concurrent probe runner.
//!
//! A [`Runner`] owns a registry of boolean probes and a pool of tokio workers
//! that execute them repeatedly, counting executions and failures and
//! optionally throttling the aggregate rate. The `probe-runner` binary wraps
//! it with a byte-copy demo probe, config loading and a text report.
pub mod args;
pub mod config;
pub mod error;
pub mod logger;
pub mod runner;

pub use runner::{
    DEFAULT_GRACEFUL_TIMEOUT, DEFAULT_PARALLEL_TESTS, FaultPolicy, Probe, ProbeOutcome,
    RunSnapshot, Runner, RunnerConfig, StopSummary, UNLIMITED_RATE,
};
