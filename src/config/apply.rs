use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{PositiveUsize, Probability, RunnerArgs, parse_rate_value};
use crate::error::{AppError, AppResult, ConfigError, ValidationError};

use super::types::{ConfigFile, DurationValue};

/// Applies configuration values to CLI arguments.
///
/// Values given on the command line are kept; the config only fills in what
/// was left at its default.
///
/// # Errors
///
/// Returns an error when a config value is out of range.
pub fn apply_config(
    args: &mut RunnerArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "parallel_tests")
        && let Some(parallel) = config.parallel
    {
        args.parallel_tests = parallel;
    }

    if !is_cli(matches, "target_rate")
        && let Some(rate) = config.rate
    {
        args.target_rate = parse_rate_value(rate).map_err(|err| invalid("rate", err))?;
    }

    if !is_cli(matches, "duration")
        && let Some(duration) = config.duration.as_ref()
    {
        args.duration = to_duration(duration, "duration")?;
    }

    if !is_cli(matches, "report_interval")
        && let Some(interval) = config.report_interval.as_ref()
    {
        args.report_interval = to_duration(interval, "report_interval")?;
    }

    if !is_cli(matches, "graceful_timeout")
        && let Some(timeout) = config.graceful_timeout.as_ref()
    {
        args.graceful_timeout = to_duration(timeout, "graceful_timeout")?;
    }

    if !is_cli(matches, "payload_bytes")
        && let Some(bytes) = config.payload_bytes
    {
        args.payload_bytes =
            PositiveUsize::try_from(bytes).map_err(|err| invalid("payload_bytes", err))?;
    }

    if !is_cli(matches, "failure_rate")
        && let Some(rate) = config.failure_rate
    {
        args.failure_rate =
            Probability::try_from(rate).map_err(|err| invalid("failure_rate", err))?;
    }

    if !is_cli(matches, "fault_policy")
        && let Some(policy) = config.fault_policy
    {
        args.fault_policy = policy;
    }

    if !is_cli(matches, "verbose")
        && let Some(verbose) = config.verbose
    {
        args.verbose = verbose;
    }

    Ok(())
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

fn to_duration(value: &DurationValue, field: &'static str) -> AppResult<std::time::Duration> {
    value.to_duration().map_err(|err| invalid(field, err))
}

fn invalid(field: &'static str, source: ValidationError) -> AppError {
    AppError::config(ConfigError::InvalidField { field, source })
}
