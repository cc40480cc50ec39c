use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::ValidationError;

type BlockingProbeFn = dyn Fn() -> bool + Send + Sync;
type AsyncProbeFn = dyn Fn(CancellationToken) -> BoxFuture<'static, bool> + Send + Sync;

/// A registered unit of work. `true` means the test passed.
///
/// Blocking probes run on Tokio's blocking pool so a slow probe cannot starve
/// the scheduler. Async probes run inline on the worker task and receive a
/// token that is cancelled when the runner stops.
#[derive(Clone)]
pub enum Probe {
    Blocking(Arc<BlockingProbeFn>),
    Async(Arc<AsyncProbeFn>),
}

impl Probe {
    pub fn blocking<F>(probe: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self::Blocking(Arc::new(probe))
    }

    pub fn from_async<F, Fut>(probe: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self::Async(Arc::new(move |token| probe(token).boxed()))
    }

    pub(super) async fn execute(&self, cancel: &CancellationToken) -> ProbeOutcome {
        match self {
            Self::Blocking(probe) => {
                let probe = Arc::clone(probe);
                match tokio::task::spawn_blocking(move || probe()).await {
                    Ok(passed) => ProbeOutcome::from_result(passed),
                    Err(err) if err.is_panic() => {
                        ProbeOutcome::Faulted(panic_message(err.into_panic().as_ref()))
                    }
                    Err(err) => ProbeOutcome::Faulted(err.to_string()),
                }
            }
            Self::Async(probe) => {
                let token = cancel.child_token();
                let result = AssertUnwindSafe(async move { probe(token).await })
                    .catch_unwind()
                    .await;
                match result {
                    Ok(passed) => ProbeOutcome::from_result(passed),
                    Err(payload) => ProbeOutcome::Faulted(panic_message(payload.as_ref())),
                }
            }
        }
    }
}

impl fmt::Debug for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocking(_) => f.write_str("Probe::Blocking"),
            Self::Async(_) => f.write_str("Probe::Async"),
        }
    }
}

/// Result of a single probe invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Passed,
    Failed,
    /// The probe panicked; carries the panic message.
    Faulted(String),
}

impl ProbeOutcome {
    const fn from_result(passed: bool) -> Self {
        if passed { Self::Passed } else { Self::Failed }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// What a worker does after a probe panics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaultPolicy {
    /// Count the panic as a failed test and keep the worker going.
    #[default]
    CountAsFailure,
    /// Let the worker exit without counting the probe; the pool shrinks.
    StopWorker,
}

impl FaultPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CountAsFailure => "count-as-failure",
            Self::StopWorker => "stop-worker",
        }
    }
}

impl std::str::FromStr for FaultPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count-as-failure" | "count" => Ok(Self::CountAsFailure),
            "stop-worker" | "stop" => Ok(Self::StopWorker),
            _ => Err(ValidationError::InvalidFaultPolicy {
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for FaultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blocking_probe_result_maps_to_outcome() -> Result<(), String> {
        let token = CancellationToken::new();
        let pass = Probe::blocking(|| true).execute(&token).await;
        let fail = Probe::blocking(|| false).execute(&token).await;
        if pass != ProbeOutcome::Passed || fail != ProbeOutcome::Failed {
            return Err(format!("Unexpected outcomes: {:?} / {:?}", pass, fail));
        }
        Ok(())
    }

    #[tokio::test]
    async fn blocking_panic_is_reported_as_fault() -> Result<(), String> {
        let token = CancellationToken::new();
        let probe = Probe::blocking(|| panic!("disk on fire"));
        match probe.execute(&token).await {
            ProbeOutcome::Faulted(message) if message.contains("disk on fire") => Ok(()),
            other => Err(format!("Unexpected outcome: {:?}", other)),
        }
    }

    #[tokio::test]
    async fn async_probe_sees_cancellation() -> Result<(), String> {
        let token = CancellationToken::new();
        token.cancel();
        let probe = Probe::from_async(|token: CancellationToken| async move {
            token.is_cancelled()
        });
        if probe.execute(&token).await != ProbeOutcome::Passed {
            return Err("Child token should inherit cancellation".to_owned());
        }
        Ok(())
    }

    #[tokio::test]
    async fn async_panic_is_reported_as_fault() -> Result<(), String> {
        let token = CancellationToken::new();
        let probe = Probe::from_async(|_token: CancellationToken| async move {
            let reason = String::from("bad payload");
            if !reason.is_empty() {
                panic!("{}", reason);
            }
            true
        });
        match probe.execute(&token).await {
            ProbeOutcome::Faulted(message) if message == "bad payload" => Ok(()),
            other => Err(format!("Unexpected outcome: {:?}", other)),
        }
    }

    #[test]
    fn fault_policy_parses_aliases() -> Result<(), String> {
        let cases = [
            ("count-as-failure", FaultPolicy::CountAsFailure),
            ("COUNT", FaultPolicy::CountAsFailure),
            (" stop-worker ", FaultPolicy::StopWorker),
            ("stop", FaultPolicy::StopWorker),
        ];
        for (raw, expected) in cases {
            let parsed: FaultPolicy = raw.parse().map_err(|err| format!("{}", err))?;
            if parsed != expected {
                return Err(format!("'{}' parsed as {:?}", raw, parsed));
            }
        }
        if "restart".parse::<FaultPolicy>().is_ok() {
            return Err("Unknown policy should be rejected".to_owned());
        }
        Ok(())
    }
}
