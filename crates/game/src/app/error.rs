use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::TryFromFloatSecsError;

use babuland_sim::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum RunnerError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("{var} must be an unsigned integer, got '{value}': {source}")]
    InvalidSeed {
        var: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config '{path}' at {field}: {source}")]
    ParseConfig {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("simulated_seconds {value} does not fit a duration: {source}")]
    SessionLength {
        value: f32,
        #[source]
        source: TryFromFloatSecsError,
    },
    #[error("failed to read leaderboard '{path}': {source}")]
    ReadLeaderboard {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse leaderboard '{path}': {source}")]
    ParseLeaderboard {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
