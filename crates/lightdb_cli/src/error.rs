//! CLI error type.

use lightdb_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The database could not be used.
    #[error("database at {path} is unavailable: {source}")]
    Unavailable {
        /// Data file path.
        path: PathBuf,
        /// The recorded startup error.
        #[source]
        source: CoreError,
    },

    /// A database operation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The configuration file could not be read or parsed.
    #[error("invalid config file {path}: {message}")]
    Config {
        /// Config file path.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// No file exists for the requested collection.
    #[error("no collection file at {0}")]
    MissingCollection(PathBuf),

    /// Writing output failed.
    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),

    /// Reading the collections folder failed.
    #[error("io error on {path}: {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;
