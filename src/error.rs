//! Error types for genome-worker

use std::path::PathBuf;
use thiserror::Error;

/// Worker-level failures: startup, broker transport, configuration.
///
/// None of these are ever turned into a job status; task-scoped problems
/// use [`TaskError`] instead.
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Broker error: {0}")]
    BrokerError(String),

    #[error("Broker connection lost: {0}")]
    ConnectionLost(String),

    #[error("Status API error: {0}")]
    StatusApiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to load species registry from {path}: {reason}")]
    RegistryLoadError { path: PathBuf, reason: String },

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl From<lapin::Error> for WorkerError {
    fn from(e: lapin::Error) -> Self {
        WorkerError::BrokerError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WorkerError>;

/// Handler-local failures for a single task message.
///
/// The `Display` text of each variant is exactly what gets sent as the
/// `error` field of a `failed` job status.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Unknown species: {0}")]
    UnknownSpecies(String),

    #[error("Genome file not found at {}", .0.display())]
    GenomeFileNotFound(PathBuf),

    #[error("Invalid genome path: {0}")]
    InvalidGenomePath(String),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Failed to start pipeline `{command}`: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
}
