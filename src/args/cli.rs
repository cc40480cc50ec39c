use clap::Parser;
use std::time::Duration;

use crate::runner::{DEFAULT_PARALLEL_TESTS, FaultPolicy, RunnerConfig, UNLIMITED_RATE};

use super::defaults::{
    DEFAULT_DURATION, DEFAULT_GRACEFUL_TIMEOUT, DEFAULT_PAYLOAD_BYTES, DEFAULT_REPORT_INTERVAL,
};
use super::parsers::{
    parse_duration_arg, parse_fault_policy, parse_positive_usize, parse_probability, parse_rate,
};
use super::types::{PositiveUsize, Probability};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Concurrent probe runner - hammers a byte-copy probe from a worker pool, with an optional aggregate rate ceiling."
)]
pub struct RunnerArgs {
    /// Number of concurrent workers
    #[arg(long = "parallel", short = 'p', default_value_t = DEFAULT_PARALLEL_TESTS)]
    pub parallel_tests: usize,

    /// Target aggregate tests per second (zero or negative disables throttling)
    #[arg(
        long = "rate",
        short = 'r',
        default_value_t = UNLIMITED_RATE,
        allow_negative_numbers = true,
        value_parser = parse_rate
    )]
    pub target_rate: f64,

    /// Total run time (supports ms/s/m/h)
    #[arg(long = "duration", short = 't', default_value = DEFAULT_DURATION, value_parser = parse_duration_arg)]
    pub duration: Duration,

    /// How often to print progress (supports ms/s/m/h)
    #[arg(long = "report-interval", default_value = DEFAULT_REPORT_INTERVAL, value_parser = parse_duration_arg)]
    pub report_interval: Duration,

    /// Maximum wait for workers to exit before they are aborted (supports ms/s/m/h)
    #[arg(long = "graceful-timeout", default_value = DEFAULT_GRACEFUL_TIMEOUT, value_parser = parse_duration_arg)]
    pub graceful_timeout: Duration,

    /// Size of the buffer copied by the demo probe
    #[arg(long = "payload-bytes", default_value = DEFAULT_PAYLOAD_BYTES, value_parser = parse_positive_usize)]
    pub payload_bytes: PositiveUsize,

    /// Probability (0-1) that the demo probe reports a failure
    #[arg(long = "failure-rate", default_value = "0", value_parser = parse_probability)]
    pub failure_rate: Probability,

    /// What a worker does when a probe panics (count-as-failure, stop-worker)
    #[arg(long = "fault-policy", default_value = "count-as-failure", value_parser = parse_fault_policy)]
    pub fault_policy: FaultPolicy,

    /// Path to config file (TOML or JSON)
    #[arg(long = "config", short = 'c')]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(long = "verbose", short = 'v')]
    pub verbose: bool,
}

impl RunnerArgs {
    #[must_use]
    pub const fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            parallel_tests: self.parallel_tests,
            target_tests_per_second: self.target_rate,
            fault_policy: self.fault_policy,
        }
    }
}
