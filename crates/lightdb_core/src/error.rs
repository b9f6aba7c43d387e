//! Error types for LightDB core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in LightDB core operations.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] lightdb_storage::StorageError),

    /// A dot-path key or collection name is malformed.
    #[error("the provided key is invalid: {key:?}")]
    InvalidKey {
        /// The rejected key.
        key: String,
    },

    /// An operand has the wrong type for the operation.
    #[error("invalid value: {message}")]
    InvalidValue {
        /// Description of what was expected.
        message: String,
    },

    /// Encryption or decryption was requested without a configured key.
    #[error("missing encryption key")]
    MissingEncryptionKey,

    /// The configured encryption key has the wrong length.
    #[error("invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        /// Expected size in bytes.
        expected: usize,
        /// Actual size in bytes.
        actual: usize,
    },

    /// Decrypting a value failed. The cause is deliberately not exposed.
    #[error("an error has occurred while decrypting a value")]
    DecryptionFailed,

    /// Persisted contents are not valid JSON of the expected shape.
    #[error("invalid database format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// A collection with this name is already registered.
    #[error("collection with name {name:?} already exists")]
    CollectionAlreadyExists {
        /// Name of the collection.
        name: String,
    },

    /// No collection with this name is registered.
    #[error("collection not found: {name}")]
    CollectionNotFound {
        /// Name of the collection.
        name: String,
    },
}

impl CoreError {
    /// Creates an invalid key error.
    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey { key: key.into() }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue {
            message: message.into(),
        }
    }

    /// Creates an invalid key size error.
    pub fn invalid_key_size(actual: usize, expected: usize) -> Self {
        Self::InvalidKeySize { expected, actual }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates a collection already exists error.
    pub fn collection_exists(name: impl Into<String>) -> Self {
        Self::CollectionAlreadyExists { name: name.into() }
    }

    /// Creates a collection not found error.
    pub fn collection_not_found(name: impl Into<String>) -> Self {
        Self::CollectionNotFound { name: name.into() }
    }
}
