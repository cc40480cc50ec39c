//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;


pub use cli::RunnerArgs;
pub use defaults::DEFAULT_CONFIG_FILES;
pub use types::{PositiveUsize, Probability};

pub(crate) use parsers::{parse_duration, parse_rate_value};
