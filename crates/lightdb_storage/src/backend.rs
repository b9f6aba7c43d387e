//! Storage backend trait definition.

use crate::error::StorageResult;
use std::path::Path;

/// A whole-content storage backend for LightDB.
///
/// Backends are **opaque byte stores** holding exactly one blob: the
/// serialized document or collection. They never interpret the bytes.
///
/// # Invariants
///
/// - `load` returns exactly the bytes passed to the last successful `replace`
/// - `replace` is atomic: a reader observes either the old or the new
///   contents, never a mix or a truncated blob
/// - A failed `replace` leaves the previous contents untouched
/// - Backends must be `Send + Sync` so writes can run off the caller's thread
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait StorageBackend: Send + Sync {
    /// Reads the full contents.
    ///
    /// Returns `Ok(None)` when nothing has been stored yet (for files: the
    /// target does not exist).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::AccessDenied`](crate::StorageError::AccessDenied)
    /// on permission failures and an I/O error otherwise.
    fn load(&self) -> StorageResult<Option<Vec<u8>>>;

    /// Atomically replaces the full contents with `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the new contents could not be made durable. The
    /// previous contents remain in place.
    fn replace(&self, data: &[u8]) -> StorageResult<()>;

    /// Returns the location this backend persists to.
    ///
    /// Used for error reporting and logging.
    fn path(&self) -> &Path;
}
