//! Test fixtures and database helpers.
//!
//! Provides convenience functions for setting up test databases
//! and common test scenarios.

use lightdb_core::{Config, Database};
use lightdb_storage::{InMemoryBackend, StorageBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Key used by fixtures that need encryption.
pub const TEST_ENCRYPTION_KEY: &str = "lightdb-test-key-0123456789abcde";

/// A test database with automatic cleanup.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
    /// Backend of an in-memory database, for inspecting physical writes.
    backend: Option<Arc<InMemoryBackend>>,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: TempDir,
}

impl TestDatabase {
    /// Creates a test database whose document lives in memory.
    ///
    /// Collections go to a temporary directory.
    pub fn memory() -> Self {
        Self::memory_with(|config| config)
    }

    /// Like [`memory`](Self::memory) with a customized configuration.
    pub fn memory_with(configure: impl FnOnce(Config) -> Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = configure(Config::new().collections_folder(temp_dir.path().join("collections")));
        let backend = Arc::new(InMemoryBackend::new());
        let db = Database::open_with_backend(config, Arc::clone(&backend) as Arc<dyn StorageBackend>);

        Self {
            db,
            backend: Some(backend),
            temp_dir,
        }
    }

    /// Creates a new file-based test database.
    pub fn file() -> Self {
        Self::file_with(|config| config)
    }

    /// Like [`file`](Self::file) with a customized configuration.
    ///
    /// The data file and collections folder point into the temporary
    /// directory before `configure` runs.
    pub fn file_with(configure: impl FnOnce(Config) -> Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open(configure(Self::file_config(temp_dir.path())));

        Self {
            db,
            backend: None,
            temp_dir,
        }
    }

    /// Creates a file-based test database with an encryption key.
    pub fn encrypted() -> Self {
        Self::file_with(|config| config.encryption_key(TEST_ENCRYPTION_KEY))
    }

    /// Flushes, drops and reopens the database with the same configuration.
    pub fn reopen(self) -> Self {
        let Self {
            db,
            backend,
            temp_dir,
        } = self;
        db.flush().expect("Failed to flush before reopening");
        let config = db.config().clone();
        drop(db);

        let (db, backend) = match backend {
            Some(old) => {
                let reloaded = Arc::new(match old.data() {
                    Some(data) => InMemoryBackend::with_data(data),
                    None => InMemoryBackend::new(),
                });
                let db = Database::open_with_backend(
                    config,
                    Arc::clone(&reloaded) as Arc<dyn StorageBackend>,
                );
                (db, Some(reloaded))
            }
            None => (Database::open(config), None),
        };

        Self {
            db,
            backend,
            temp_dir,
        }
    }

    /// Returns the in-memory backend, if this is an in-memory database.
    pub fn backend(&self) -> Option<&InMemoryBackend> {
        self.backend.as_deref()
    }

    /// Returns the data file path.
    pub fn data_file(&self) -> PathBuf {
        self.temp_dir.path().join("db.json")
    }

    /// Returns the collections folder.
    pub fn collections_folder(&self) -> PathBuf {
        self.temp_dir.path().join("collections")
    }

    /// Returns the temporary directory.
    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Reads the persisted root document after flushing.
    pub fn persisted(&self) -> serde_json::Value {
        self.db.flush().expect("Failed to flush");
        let bytes = match &self.backend {
            Some(backend) => backend.data().expect("Nothing persisted"),
            None => std::fs::read(self.data_file()).expect("Failed to read data file"),
        };
        serde_json::from_slice(&bytes).expect("Persisted document is not JSON")
    }

    fn file_config(dir: &Path) -> Config {
        Config::new()
            .data_file(dir.join("db.json"))
            .collections_folder(dir.join("collections"))
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

impl std::ops::DerefMut for TestDatabase {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.db
    }
}

/// Runs a test with a temporary in-memory database.
///
/// # Example
///
/// ```rust
/// use lightdb_testkit::with_temp_db;
///
/// with_temp_db(|db| {
///     db.set("a.b", 1).unwrap();
///     assert!(db.has("a").unwrap());
/// });
/// ```
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&mut Database) -> R,
{
    let mut test_db = TestDatabase::memory();
    f(&mut test_db.db)
}

/// Runs a test with a temporary file-based database.
pub fn with_file_db<F, R>(f: F) -> R
where
    F: FnOnce(&mut Database, &Path) -> R,
{
    let mut test_db = TestDatabase::file();
    let path = test_db.data_file();
    f(&mut test_db.db, &path)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use lightdb_core::{Defaults, Record, Value};

    /// Creates a database with `user_count` users under `users.<n>`.
    pub fn populated_database(user_count: usize) -> TestDatabase {
        let mut test_db = TestDatabase::memory();

        for i in 0..user_count {
            test_db
                .set(&format!("users.u{i}.name"), format!("user {i}"))
                .expect("Failed to set name");
            test_db
                .set(&format!("users.u{i}.age"), Value::from(20 + i as i64))
                .expect("Failed to set age");
        }

        test_db
    }

    /// Creates a database with a `people` collection of `count` records.
    ///
    /// Records get an auto-increment `id` starting at 1 and an `age`.
    pub fn collection_database(count: usize) -> TestDatabase {
        let mut test_db = TestDatabase::file();
        let people = test_db
            .create_collection("people", Defaults::new().auto_increment("id", 1))
            .expect("Failed to create collection");

        for i in 0..count {
            let mut record = Record::new();
            record.insert("age".to_string(), Value::from(18 + i as i64));
            people.insert(record).expect("Failed to insert record");
        }

        test_db
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightdb_core::Value;

    #[test]
    fn test_memory_database() {
        let mut test_db = TestDatabase::memory();
        test_db.set("a", 1).unwrap();

        assert_eq!(test_db.persisted(), serde_json::json!({"a": 1}));
        assert!(test_db.backend().unwrap().write_count() >= 1);
    }

    #[test]
    fn test_file_database_reopens() {
        let mut test_db = TestDatabase::file();
        test_db.set("a.b", "x").unwrap();

        let test_db = test_db.reopen();
        assert_eq!(test_db.get("a.b").unwrap(), Some(Value::from("x")));
        assert!(test_db.data_file().exists());
    }

    #[test]
    fn test_memory_database_reopens() {
        let mut test_db = TestDatabase::memory();
        test_db.set("n", 3).unwrap();

        let test_db = test_db.reopen();
        assert_eq!(test_db.get("n").unwrap(), Some(Value::from(3)));
    }

    #[test]
    fn test_with_temp_db() {
        let value = with_temp_db(|db| {
            db.set("k", true).unwrap();
            db.get("k").unwrap()
        });
        assert_eq!(value, Some(Value::from(true)));
    }

    #[test]
    fn test_populated_scenario() {
        let test_db = scenarios::populated_database(10);
        assert_eq!(test_db.get("users.u9.age").unwrap(), Some(Value::from(29)));
    }

    #[test]
    fn test_collection_scenario() {
        let test_db = scenarios::collection_database(3);
        let people = test_db.collection("people").unwrap();

        assert_eq!(people.len(), 3);
        assert_eq!(people.all()[2]["id"], Value::from(3));
    }
}
