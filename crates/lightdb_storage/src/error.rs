//! Error types for storage operations.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
///
/// `StorageError` is `Clone` because a single physical write outcome is
/// handed to every caller that shared that write.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file the operation targeted.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: Arc<io::Error>,
    },

    /// The process lacks permission to read or write the file.
    #[error("the file {} could not be accessed", path.display())]
    AccessDenied {
        /// The file that could not be accessed.
        path: PathBuf,
    },

    /// The path cannot be used as a data file or folder.
    #[error("invalid path {}: {reason}", path.display())]
    InvalidPath {
        /// The rejected path.
        path: PathBuf,
        /// Why the path was rejected.
        reason: String,
    },
}

impl StorageError {
    /// Classifies an I/O error raised while touching `path`.
    ///
    /// Permission failures become [`StorageError::AccessDenied`]; everything
    /// else is kept as [`StorageError::Io`].
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::PermissionDenied {
            Self::AccessDenied {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source: Arc::new(err),
            }
        }
    }

    /// Creates an invalid path error.
    pub fn invalid_path(path: &Path, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}
