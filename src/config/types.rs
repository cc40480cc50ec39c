use std::time::Duration;

use serde::Deserialize;

use crate::args::parse_duration;
use crate::error::ValidationError;
use crate::runner::FaultPolicy;

/// On-disk run settings. Every field is optional; CLI flags win.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(alias = "parallel_tests", alias = "workers")]
    pub parallel: Option<usize>,
    #[serde(alias = "target_tests_per_second")]
    pub rate: Option<f64>,
    pub duration: Option<DurationValue>,
    pub report_interval: Option<DurationValue>,
    pub graceful_timeout: Option<DurationValue>,
    pub payload_bytes: Option<usize>,
    pub failure_rate: Option<f64>,
    pub fault_policy: Option<FaultPolicy>,
    pub verbose: Option<bool>,
}

/// Either a bare number of seconds or a suffixed string such as `"250ms"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ValidationError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => parse_duration(text),
        }
    }
}
