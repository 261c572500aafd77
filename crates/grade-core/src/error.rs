use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the transcript analyzer.
#[derive(Error, Debug)]
pub enum GradeError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Neither the embedded `progressGrades` line nor the whole file yielded
    /// a usable grades payload.
    #[error("Unrecognised transcript source: {0}")]
    SourceFormat(String),

    /// A subject classification rule is malformed.
    #[error("Invalid subject rule: {0}")]
    InvalidRule(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the grade crates.
pub type Result<T> = std::result::Result<T, GradeError>;
