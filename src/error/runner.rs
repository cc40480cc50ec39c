use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Runner is already running. Stop it before starting again.")]
    AlreadyRunning,
    #[error("Runner is still stopping. Wait for stop to finish before starting again.")]
    Stopping,
    #[error("Runner must be started from within a Tokio runtime: {source}")]
    NoRuntime {
        #[source]
        source: tokio::runtime::TryCurrentError,
    },
}
