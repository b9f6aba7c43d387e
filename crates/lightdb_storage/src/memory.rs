//! In-memory storage backend for testing.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// An in-memory storage backend.
///
/// This backend stores the blob in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral databases that don't need persistence
///
/// Only the latest contents are kept. Successful `replace` calls are
/// counted so tests can observe physical writes.
///
/// # Example
///
/// ```rust
/// use lightdb_storage::{InMemoryBackend, StorageBackend};
///
/// let backend = InMemoryBackend::new();
/// backend.replace(b"{}").unwrap();
/// assert_eq!(backend.load().unwrap(), Some(b"{}".to_vec()));
/// assert_eq!(backend.write_count(), 1);
/// ```
#[derive(Debug)]
pub struct InMemoryBackend {
    path: PathBuf,
    data: RwLock<Option<Vec<u8>>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self {
            path: PathBuf::from(":memory:"),
            data: RwLock::new(None),
            writes: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
        }
    }
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory backend with pre-existing contents.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(Some(data)),
            ..Self::default()
        }
    }

    /// Returns a copy of the current contents.
    #[must_use]
    pub fn data(&self) -> Option<Vec<u8>> {
        self.data.read().clone()
    }

    /// Returns the number of successful physical writes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes subsequent writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl StorageBackend for InMemoryBackend {
    fn load(&self) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.data.read().clone())
    }

    fn replace(&self, data: &[u8]) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::from_io(
                &self.path,
                io::Error::new(io::ErrorKind::Other, "injected write failure"),
            ));
        }

        *self.data.write() = Some(data.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_starts_empty() {
        let backend = InMemoryBackend::new();
        assert_eq!(backend.load().unwrap(), None);
        assert_eq!(backend.write_count(), 0);
    }

    #[test]
    fn memory_with_data() {
        let backend = InMemoryBackend::with_data(b"[1,2]".to_vec());
        assert_eq!(backend.load().unwrap(), Some(b"[1,2]".to_vec()));
        assert_eq!(backend.write_count(), 0);
    }

    #[test]
    fn memory_counts_writes() {
        let backend = InMemoryBackend::new();
        backend.replace(b"one").unwrap();
        backend.replace(b"two").unwrap();

        assert_eq!(backend.data(), Some(b"two".to_vec()));
        assert_eq!(backend.write_count(), 2);
    }

    #[test]
    fn memory_keeps_only_latest_contents() {
        let backend = InMemoryBackend::new();
        let blob = vec![b'x'; 100 * 1024];
        for _ in 0..200 {
            backend.replace(&blob).unwrap();
        }

        assert_eq!(backend.write_count(), 200);
        assert_eq!(backend.data().map(|d| d.len()), Some(blob.len()));
        assert_eq!(backend.data.read().as_ref().map(Vec::capacity), Some(blob.len()));
    }

    #[test]
    fn memory_injected_failure_keeps_contents() {
        let backend = InMemoryBackend::with_data(b"old".to_vec());
        backend.set_fail_writes(true);

        assert!(backend.replace(b"new").is_err());
        assert_eq!(backend.data(), Some(b"old".to_vec()));

        backend.set_fail_writes(false);
        backend.replace(b"new").unwrap();
        assert_eq!(backend.data(), Some(b"new".to_vec()));
    }
}
