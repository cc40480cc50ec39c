use std::time::Duration;

use super::types::{PositiveUsize, Probability};
use crate::error::{AppError, AppResult, ValidationError};
use crate::runner::FaultPolicy;

pub(super) fn parse_positive_usize(s: &str) -> AppResult<PositiveUsize> {
    s.parse::<PositiveUsize>().map_err(AppError::from)
}

pub(super) fn parse_probability(s: &str) -> AppResult<Probability> {
    s.parse::<Probability>().map_err(AppError::from)
}

pub(super) fn parse_fault_policy(s: &str) -> AppResult<FaultPolicy> {
    s.parse::<FaultPolicy>().map_err(AppError::from)
}

pub(super) fn parse_rate(s: &str) -> AppResult<f64> {
    let value = s.trim();
    let rate: f64 = value.parse().map_err(|err| {
        AppError::validation(ValidationError::InvalidRate {
            value: value.to_owned(),
            source: err,
        })
    })?;
    parse_rate_value(rate).map_err(AppError::from)
}

/// Any finite value is accepted; zero or below means unlimited.
pub(crate) fn parse_rate_value(rate: f64) -> Result<f64, ValidationError> {
    if rate.is_finite() {
        Ok(rate)
    } else {
        Err(ValidationError::RateNotFinite {
            value: rate.to_string(),
        })
    }
}

pub(super) fn parse_duration_arg(s: &str) -> AppResult<Duration> {
    parse_duration(s).map_err(AppError::from)
}

/// Parses `<number>[ms|s|m|h]`, defaulting to seconds. Zero is rejected.
pub(crate) fn parse_duration(s: &str) -> Result<Duration, ValidationError> {
    let value = s.trim();
    if value.is_empty() {
        return Err(ValidationError::DurationEmpty);
    }

    let mut digits_len = 0usize;
    for ch in value.chars() {
        if ch.is_ascii_digit() {
            digits_len = digits_len.saturating_add(1);
        } else {
            break;
        }
    }
    if digits_len == 0 {
        return Err(ValidationError::InvalidDurationFormat {
            value: value.to_owned(),
        });
    }
    let (num_part, unit_part) = value.split_at(digits_len);
    let number: u64 = num_part
        .parse()
        .map_err(|err| ValidationError::InvalidDurationNumber {
            value: value.to_owned(),
            source: err,
        })?;

    let unit = if unit_part.is_empty() { "s" } else { unit_part };
    let duration = match unit {
        "ms" => Duration::from_millis(number),
        "s" => Duration::from_secs(number),
        "m" => {
            let secs = number
                .checked_mul(60)
                .ok_or(ValidationError::DurationOverflow)?;
            Duration::from_secs(secs)
        }
        "h" => {
            let secs = number
                .checked_mul(60)
                .and_then(|seconds| seconds.checked_mul(60))
                .ok_or(ValidationError::DurationOverflow)?;
            Duration::from_secs(secs)
        }
        _ => {
            return Err(ValidationError::InvalidDurationUnit {
                unit: unit.to_owned(),
            });
        }
    };

    if duration.is_zero() {
        return Err(ValidationError::DurationZero);
    }

    Ok(duration)
}
