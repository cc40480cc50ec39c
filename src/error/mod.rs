mod app;
mod config;
mod runner;
mod validation;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use runner::RunnerError;
pub use validation::ValidationError;
