use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid exclusion pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Root directory '{0}' does not exist or is not readable")]
    UnreadableRoot(PathBuf),

    #[error("Manifest error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Manifest error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Conflict decision error: {0}")]
    ConflictDecision(String),

    #[error("{0}")]
    Other(String),
}
