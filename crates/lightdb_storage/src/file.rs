//! File-based storage backend for persistent storage.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A file-based storage backend.
///
/// Contents are replaced with the write-then-rename pattern:
/// 1. Write the full contents to a hidden temporary sibling (`.<name>.tmp`)
/// 2. Sync the temporary file to disk
/// 3. Rename the temporary file over the target
/// 4. Fsync the parent directory so the rename itself is durable
///
/// The rename is the atomicity boundary. A crash or error before it leaves
/// the target untouched.
///
/// # Example
///
/// ```no_run
/// use lightdb_storage::{FileBackend, StorageBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::open(Path::new("data.json"));
/// backend.replace(b"{}").unwrap();
/// assert_eq!(backend.load().unwrap(), Some(b"{}".to_vec()));
/// ```
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
    temp_path: PathBuf,
}

impl FileBackend {
    /// Creates a backend for the file at `path`.
    ///
    /// Nothing is touched on disk until the first `load` or `replace`.
    #[must_use]
    pub fn open(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            temp_path: temp_sibling(path),
        }
    }

    /// Returns the path of the temporary sibling used during writes.
    #[must_use]
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    fn write_temp(&self, data: &[u8]) -> io::Result<()> {
        let mut file = File::create(&self.temp_path)?;
        file.write_all(data)?;
        file.sync_all()
    }

    /// Syncs the parent directory so the rename is durable.
    #[cfg(unix)]
    fn sync_parent(&self) -> io::Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        File::open(parent)?.sync_all()
    }

    #[cfg(not(unix))]
    fn sync_parent(&self) -> io::Result<()> {
        // NTFS journals metadata; directory handles cannot be fsynced.
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn load(&self) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::from_io(&self.path, e)),
        }
    }

    fn replace(&self, data: &[u8]) -> StorageResult<()> {
        if let Err(e) = self.write_temp(data) {
            let _ = fs::remove_file(&self.temp_path);
            return Err(StorageError::from_io(&self.temp_path, e));
        }

        if let Err(e) = fs::rename(&self.temp_path, &self.path) {
            let _ = fs::remove_file(&self.temp_path);
            return Err(StorageError::from_io(&self.path, e));
        }

        self.sync_parent()
            .map_err(|e| StorageError::from_io(&self.path, e))
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Returns `<dir>/.<name>.tmp` for `<dir>/<name>`.
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}
