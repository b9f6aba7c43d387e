//! Database facade.

use crate::collection::{Collection, Defaults};
use crate::config::Config;
use crate::crypto::{CryptoBox, EncryptionKey, KEY_SIZE};
use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::path::{self, PathStatus};
use crate::value::Value;
use lightdb_storage::{
    AtomicStore, EmptyShape, InMemoryBackend, StorageBackend, StorageError, WriteTicket,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Largest integer magnitude an `f64` delta represents exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Encryption setup derived from the configured key.
enum Cipher {
    /// No key configured.
    Disabled,
    /// A usable key.
    Ready(CryptoBox),
    /// A key of the wrong length.
    Invalid { actual: usize },
}

/// The main database handle.
///
/// `Database` owns one JSON document addressed by dot-path keys plus any
/// number of record collections, each persisted to its own file.
///
/// # Opening a Database
///
/// Opening never fails. If the data file cannot be used, the problem is
/// logged and every later data operation returns it:
///
/// ```rust,ignore
/// use lightdb_core::{Config, Database};
///
/// let mut db = Database::open(Config::new().data_file("app.json"));
///
/// db.set("user.name", "ann")?;
/// assert_eq!(db.get("user.name")?, Some("ann".into()));
///
/// db.flush()?;
/// ```
///
/// # Persistence
///
/// With auto-save enabled, every mutation queues a write of the whole
/// document and returns without waiting for it. Writes issued while one is
/// in flight are coalesced, so only the newest snapshot is written next.
/// Use [`flush`](Self::flush) to wait for the outcome.
///
/// # In-Memory Databases
///
/// For testing, use `Database::open_in_memory()`:
///
/// ```rust
/// let mut db = lightdb_core::Database::open_in_memory();
/// db.set("a.b", 1).unwrap();
/// assert!(db.has("a").unwrap());
/// ```
pub struct Database {
    /// Configuration.
    config: Config,
    /// The root document.
    document: Document,
    /// Persistence for the root document.
    store: AtomicStore,
    /// Encryption setup.
    cipher: Cipher,
    /// Registered collections in creation order.
    collections: Vec<Collection>,
    /// Failure recorded while opening, returned by every data operation.
    startup_error: Option<CoreError>,
    /// Ticket of the most recent save.
    last_save: Option<WriteTicket>,
}

impl Database {
    /// Opens the database described by `config`.
    ///
    /// An absent data file is created as `{}`. A data file without the
    /// `.json` extension, an inaccessible file or unparseable contents put
    /// the database in a degraded state instead of failing here.
    #[must_use]
    pub fn open(config: Config) -> Self {
        let data_file = config.data_file.clone();
        let store = AtomicStore::file(&data_file);

        let probe: CoreResult<()> = match path::check_data_file(&data_file) {
            PathStatus::WrongExtension => Err(StorageError::invalid_path(
                &data_file,
                format!("the data file must have a .{} extension", path::DATA_FILE_EXTENSION),
            )
            .into()),
            PathStatus::AccessDenied => Err(StorageError::AccessDenied {
                path: data_file.clone(),
            }
            .into()),
            _ => Ok(()),
        };

        Self::start(config, store, probe)
    }

    /// Opens a database persisting its document to `backend`.
    ///
    /// Collections still live under the configured collections folder.
    #[must_use]
    pub fn open_with_backend(config: Config, backend: Arc<dyn StorageBackend>) -> Self {
        Self::start(config, AtomicStore::new(backend), Ok(()))
    }

    /// Opens a database whose document lives in memory only.
    #[must_use]
    pub fn open_in_memory() -> Self {
        Self::open_with_backend(Config::default(), Arc::new(InMemoryBackend::new()))
    }

    fn start(config: Config, store: AtomicStore, probe: CoreResult<()>) -> Self {
        let cipher = match config.encryption_key.as_deref() {
            None => Cipher::Disabled,
            Some(key) => match EncryptionKey::from_passphrase(key) {
                Ok(key) => Cipher::Ready(CryptoBox::new(key)),
                Err(e) => {
                    error!(error = %e, "encryption key rejected");
                    Cipher::Invalid { actual: key.len() }
                }
            },
        };

        let mut db = Self {
            config,
            document: Document::new(),
            store,
            cipher,
            collections: Vec::new(),
            startup_error: None,
            last_save: None,
        };

        let opened = probe.and_then(|()| db.read_document());
        if let Err(e) = opened {
            error!(path = %db.path().display(), error = %e, "database opened in degraded state");
            db.startup_error = Some(e);
        } else {
            debug!(path = %db.path().display(), keys = db.document.len(), "database opened");
        }

        db
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the location of the root document.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Returns the error recorded while opening, if any.
    #[must_use]
    pub fn startup_error(&self) -> Option<&CoreError> {
        self.startup_error.as_ref()
    }

    // ========================================================================
    // Document operations
    // ========================================================================

    /// Returns the value at `key`, or `None` if the path does not resolve.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKey`] for malformed keys.
    pub fn get(&self, key: &str) -> CoreResult<Option<Value>> {
        self.ensure_ready()?;
        let segments = path::parse(key)?;
        Ok(self.document.get(&segments).cloned())
    }

    /// Returns true if `key` resolves to a value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKey`] for malformed keys.
    pub fn has(&self, key: &str) -> CoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Decrypts the value stored at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingEncryptionKey`] without a configured key
    /// and [`CoreError::DecryptionFailed`] if the value is absent or not a
    /// token produced by [`set_encrypted`](Self::set_encrypted).
    pub fn get_decrypted(&self, key: &str) -> CoreResult<String> {
        self.ensure_ready()?;
        let segments = path::parse(key)?;
        let crypto = self.crypto()?;

        match self.document.get(&segments).and_then(Value::as_str) {
            Some(token) => crypto.decrypt(token),
            None => Err(CoreError::DecryptionFailed),
        }
    }

    /// Stores `value` at `key`.
    ///
    /// Returns the value of the key's first segment afterwards. Setting a
    /// value equal to the current one changes nothing and writes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKey`] for malformed keys.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> CoreResult<Option<Value>> {
        self.ensure_ready()?;
        let segments = path::parse(key)?;
        self.assign(&segments, value.into())
    }

    /// Encrypts `plaintext` and stores the token at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidValue`] if `plaintext` is not a string
    /// and [`CoreError::MissingEncryptionKey`] without a configured key.
    pub fn set_encrypted(
        &mut self,
        key: &str,
        plaintext: impl Into<Value>,
    ) -> CoreResult<Option<Value>> {
        self.ensure_ready()?;
        let segments = path::parse(key)?;
        let plaintext = plaintext.into();
        let Some(text) = plaintext.as_str() else {
            return Err(CoreError::invalid_value(format!(
                "only strings can be encrypted, found {}",
                plaintext.type_name()
            )));
        };

        let token = self.crypto()?.encrypt(text);
        self.assign(&segments, Value::from(token))
    }

    /// Deletes the entry at `key`.
    ///
    /// Returns true if a value existed and the key no longer resolves.
    /// Removing a key that does not exist changes nothing and queues no
    /// save.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKey`] for malformed keys.
    pub fn remove(&mut self, key: &str) -> CoreResult<bool> {
        self.ensure_ready()?;
        let segments = path::parse(key)?;

        let removed = self.document.remove(&segments);
        if removed {
            self.persist()?;
        }
        Ok(removed && self.document.get(&segments).is_none())
    }

    /// Adds `delta` to the number at `key`; an absent value counts as 0.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidValue`] if `delta` is not finite or the
    /// current value is not a number.
    pub fn add(&mut self, key: &str, delta: f64) -> CoreResult<Option<Value>> {
        self.add_or_subtract(key, delta)
    }

    /// Subtracts `delta` from the number at `key`; an absent value counts as 0.
    ///
    /// # Errors
    ///
    /// Same as [`add`](Self::add).
    pub fn subtract(&mut self, key: &str, delta: f64) -> CoreResult<Option<Value>> {
        self.add_or_subtract(key, -delta)
    }

    /// Appends `value` to the array at `key`; an absent value counts as `[]`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidValue`] if the current value is not an
    /// array.
    pub fn push_into_array(
        &mut self,
        key: &str,
        value: impl Into<Value>,
    ) -> CoreResult<Option<Value>> {
        self.ensure_ready()?;
        let segments = path::parse(key)?;

        let mut items = self.array_at(&segments)?;
        items.push(value.into());
        self.assign(&segments, Value::from(items))
    }

    /// Drops every element equal to `value` from the array at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidValue`] if the current value is not an
    /// array.
    pub fn remove_from_array(
        &mut self,
        key: &str,
        value: impl Into<Value>,
    ) -> CoreResult<Option<Value>> {
        self.ensure_ready()?;
        let segments = path::parse(key)?;
        let value = value.into();

        let mut items = self.array_at(&segments)?;
        items.retain(|item| *item != value);
        self.assign(&segments, Value::from(items))
    }

    /// Returns a view of the whole document that later changes never alter.
    #[must_use]
    pub fn document(&self) -> Value {
        self.document.root()
    }

    /// Returns a deep, independent copy of the whole document.
    #[must_use]
    pub fn to_snapshot(&self) -> serde_json::Value {
        self.document.to_json()
    }

    /// Removes every key from the document.
    ///
    /// # Errors
    ///
    /// Returns the startup error, if any.
    pub fn clean(&mut self) -> CoreResult<()> {
        self.ensure_ready()?;
        self.document.clear();
        self.persist()
    }

    /// Replaces the in-memory document with the persisted one.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the file cannot be read and
    /// [`CoreError::InvalidFormat`] if it is not a JSON object.
    pub fn load(&mut self) -> CoreResult<()> {
        self.ensure_ready()?;
        self.read_document()
    }

    /// Queues a write of the current document.
    ///
    /// # Errors
    ///
    /// Returns the startup error, if any.
    pub fn save(&mut self) -> CoreResult<WriteTicket> {
        self.ensure_ready()?;
        let bytes = self.document.to_bytes(self.config.tab_size)?;
        let ticket = self.store.write(bytes);
        self.last_save = Some(ticket.clone());
        Ok(ticket)
    }

    /// Waits for every pending write of the database and its collections.
    ///
    /// # Errors
    ///
    /// Returns the outcome of the most recent failed save.
    pub fn flush(&self) -> CoreResult<()> {
        self.store.wait_idle();
        let mut outcome = match &self.last_save {
            Some(ticket) => ticket.wait().map_err(CoreError::from),
            None => Ok(()),
        };

        for collection in &self.collections {
            if let Err(e) = collection.flush() {
                outcome = outcome.and(Err(e));
            }
        }
        outcome
    }

    // ========================================================================
    // Collections
    // ========================================================================

    /// Creates the collection `name`, loading its file if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKey`] for malformed names,
    /// [`CoreError::CollectionAlreadyExists`] for duplicates, and a storage
    /// error if the collections folder is unusable.
    pub fn create_collection(
        &mut self,
        name: &str,
        defaults: Defaults,
    ) -> CoreResult<&mut Collection> {
        path::validate(name)?;
        if self.collections.iter().any(|c| c.name() == name) {
            return Err(CoreError::collection_exists(name));
        }

        let folder = self.config.collections_folder.clone();
        prepare_folder(&folder)?;

        let file = folder.join(format!("{name}.{}", path::DATA_FILE_EXTENSION));
        let collection = Collection::open(
            name,
            AtomicStore::file(&file),
            defaults,
            self.config.auto_save,
            self.config.tab_size,
        )?;

        info!(collection = name, path = %file.display(), "collection created");
        self.collections.push(collection);
        let index = self.collections.len() - 1;
        Ok(&mut self.collections[index])
    }

    /// Returns the collection `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] if it was never created.
    pub fn collection(&self, name: &str) -> CoreResult<&Collection> {
        self.collections
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| CoreError::collection_not_found(name))
    }

    /// Returns the collection `name` for modification.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] if it was never created.
    pub fn collection_mut(&mut self, name: &str) -> CoreResult<&mut Collection> {
        self.collections
            .iter_mut()
            .find(|c| c.name() == name)
            .ok_or_else(|| CoreError::collection_not_found(name))
    }

    /// Unregisters the collection `name` and deletes its file.
    ///
    /// Pending writes of the collection land before the file is removed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] if it was never created and
    /// a storage error if the file cannot be removed.
    pub fn delete_collection(&mut self, name: &str) -> CoreResult<()> {
        let index = self
            .collections
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| CoreError::collection_not_found(name))?;

        let collection = self.collections.remove(index);
        let file = collection.path().to_path_buf();
        drop(collection);

        match fs::remove_file(&file) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::from_io(&file, e).into()),
        }

        info!(collection = name, "collection deleted");
        Ok(())
    }

    /// Returns the names of all collections in creation order.
    #[must_use]
    pub fn collection_names(&self) -> Vec<&str> {
        self.collections.iter().map(Collection::name).collect()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn ensure_ready(&self) -> CoreResult<()> {
        match &self.startup_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn crypto(&self) -> CoreResult<&CryptoBox> {
        match &self.cipher {
            Cipher::Ready(crypto) => Ok(crypto),
            Cipher::Disabled => Err(CoreError::MissingEncryptionKey),
            Cipher::Invalid { actual } => Err(CoreError::invalid_key_size(*actual, KEY_SIZE)),
        }
    }

    fn read_document(&mut self) -> CoreResult<()> {
        let bytes = self.store.read(EmptyShape::Object)?;
        self.document = Document::from_bytes(&bytes)?;
        Ok(())
    }

    /// Stores `value` unless it equals the current one, then auto-saves.
    fn assign(&mut self, segments: &[&str], value: Value) -> CoreResult<Option<Value>> {
        if self.document.get(segments) != Some(&value) {
            self.document.set(segments, value);
            self.persist()?;
        }
        Ok(self.document.get(&segments[..1]).cloned())
    }

    fn persist(&mut self) -> CoreResult<()> {
        if self.config.auto_save {
            self.save()?;
        }
        Ok(())
    }

    fn add_or_subtract(&mut self, key: &str, delta: f64) -> CoreResult<Option<Value>> {
        self.ensure_ready()?;
        if !delta.is_finite() {
            return Err(CoreError::invalid_value("the amount must be a finite number"));
        }
        let segments = path::parse(key)?;

        let current = match self.document.get(&segments) {
            None | Some(Value::Null) => Value::from(0),
            Some(value) if value.is_number() => value.clone(),
            Some(other) => {
                return Err(CoreError::invalid_value(format!(
                    "the value at {key:?} must be a number, found {}",
                    other.type_name()
                )))
            }
        };

        self.assign(&segments, sum(&current, delta))
    }

    fn array_at(&self, segments: &[&str]) -> CoreResult<Vec<Value>> {
        match self.document.get(segments) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(Vec::clone(items)),
            Some(other) => Err(CoreError::invalid_value(format!(
                "the value at {:?} must be an array, found {}",
                segments.join("."),
                other.type_name()
            ))),
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path())
            .field("keys", &self.document.len())
            .field("collections", &self.collection_names())
            .field("degraded", &self.startup_error.is_some())
            .finish_non_exhaustive()
    }
}

/// Makes sure the collections folder exists and is a directory.
fn prepare_folder(folder: &Path) -> CoreResult<()> {
    match path::check_folder(folder) {
        PathStatus::Ready => Ok(()),
        PathStatus::Missing => {
            info!(path = %folder.display(), "creating collections folder");
            fs::create_dir_all(folder).map_err(|e| CoreError::from(StorageError::from_io(folder, e)))
        }
        PathStatus::AccessDenied => Err(StorageError::AccessDenied {
            path: folder.to_path_buf(),
        }
        .into()),
        PathStatus::NotADirectory | PathStatus::WrongExtension => {
            Err(StorageError::invalid_path(folder, "the collections folder must be a directory").into())
        }
    }
}

/// `current + delta`, staying an integer when the result is exact.
fn sum(current: &Value, delta: f64) -> Value {
    if let Some(base) = current.as_i64() {
        if delta.fract() == 0.0 && delta.abs() <= MAX_EXACT_INTEGER {
            if let Some(total) = base.checked_add(delta as i64) {
                return Value::from(total);
            }
        }
    }
    Value::from(current.as_f64().unwrap_or_default() + delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::{tempdir, TempDir};

    const KEY: &str = "0123456789abcdef0123456789abcdef";

    fn memory_db(config: Config) -> (Database, Arc<InMemoryBackend>) {
        let backend = Arc::new(InMemoryBackend::with_data(b"{}".to_vec()));
        let db = Database::open_with_backend(config, Arc::clone(&backend) as Arc<dyn StorageBackend>);
        (db, backend)
    }

    fn file_db(dir: &TempDir) -> Database {
        Database::open(
            Config::new()
                .data_file(dir.path().join("db.json"))
                .collections_folder(dir.path().join("collections")),
        )
    }

    fn persisted(backend: &InMemoryBackend) -> serde_json::Value {
        serde_json::from_slice(&backend.data().unwrap()).unwrap()
    }

    #[test]
    fn set_then_get() {
        let (mut db, backend) = memory_db(Config::new());

        let state = db.set("user.name", "ann").unwrap();
        db.flush().unwrap();

        assert_eq!(state, Some(Value::from(json!({"name": "ann"}))));
        assert_eq!(db.get("user.name").unwrap(), Some(Value::from("ann")));
        assert_eq!(persisted(&backend), json!({"user": {"name": "ann"}}));
    }

    #[test]
    fn identical_set_does_not_write() {
        let (mut db, backend) = memory_db(Config::new());

        db.set("a", json!([1, 2])).unwrap();
        db.flush().unwrap();
        let writes = backend.write_count();

        db.set("a", json!([1, 2])).unwrap();
        db.flush().unwrap();

        assert_eq!(backend.write_count(), writes);
    }

    #[test]
    fn set_integer_over_rounded_float_writes() {
        let (mut db, backend) = memory_db(Config::new());

        db.set("n", 9_007_199_254_740_992.0).unwrap();
        db.flush().unwrap();
        let writes = backend.write_count();

        db.set("n", 9_007_199_254_740_993_i64).unwrap();
        db.flush().unwrap();

        assert_eq!(db.get("n").unwrap(), Some(Value::from(9_007_199_254_740_993_i64)));
        assert_eq!(backend.write_count(), writes + 1);
        assert_eq!(persisted(&backend), json!({"n": 9_007_199_254_740_993_i64}));
    }

    #[test]
    fn removing_missing_key_does_not_write() {
        let (mut db, backend) = memory_db(Config::new());
        db.set("a", 1).unwrap();
        db.flush().unwrap();
        let writes = backend.write_count();

        assert!(!db.remove("b").unwrap());
        assert!(!db.remove("a.b").unwrap());
        db.flush().unwrap();

        assert_eq!(backend.write_count(), writes);
        assert_eq!(persisted(&backend), json!({"a": 1}));
    }

    #[test]
    fn invalid_keys_are_rejected() {
        let (mut db, _) = memory_db(Config::new());

        assert!(matches!(db.get("a..b"), Err(CoreError::InvalidKey { .. })));
        assert!(matches!(db.set(".a", 1), Err(CoreError::InvalidKey { .. })));
        assert!(matches!(db.remove(""), Err(CoreError::InvalidKey { .. })));
    }

    #[test]
    fn remove_and_has() {
        let (mut db, _) = memory_db(Config::new());
        db.set("a.b", 1).unwrap();

        assert!(db.has("a.b").unwrap());
        assert!(db.remove("a.b").unwrap());
        assert!(!db.has("a.b").unwrap());
        assert!(!db.remove("a.b").unwrap());
        assert_eq!(db.get("a").unwrap(), Some(Value::from(json!({}))));
    }

    #[test]
    fn add_and_subtract() {
        let (mut db, _) = memory_db(Config::new());

        db.add("count", 5.0).unwrap();
        db.subtract("count", 2.0).unwrap();
        assert_eq!(db.get("count").unwrap(), Some(Value::from(3)));
        assert_eq!(db.to_snapshot(), json!({"count": 3}));

        db.add("count", 0.5).unwrap();
        assert_eq!(db.get("count").unwrap(), Some(Value::from(3.5)));
    }

    #[test]
    fn add_rejects_bad_operands() {
        let (mut db, _) = memory_db(Config::new());
        db.set("name", "ann").unwrap();

        assert!(matches!(db.add("name", 1.0), Err(CoreError::InvalidValue { .. })));
        assert!(matches!(
            db.add("n", f64::INFINITY),
            Err(CoreError::InvalidValue { .. })
        ));
        assert!(matches!(db.add("n", f64::NAN), Err(CoreError::InvalidValue { .. })));
    }

    #[test]
    fn push_and_remove_from_array() {
        let (mut db, _) = memory_db(Config::new());

        db.push_into_array("tags", "a").unwrap();
        db.push_into_array("tags", "b").unwrap();
        db.push_into_array("tags", "a").unwrap();
        assert_eq!(db.to_snapshot(), json!({"tags": ["a", "b", "a"]}));

        db.remove_from_array("tags", "a").unwrap();
        assert_eq!(db.to_snapshot(), json!({"tags": ["b"]}));
    }

    #[test]
    fn array_ops_require_arrays() {
        let (mut db, _) = memory_db(Config::new());
        db.set("n", 1).unwrap();

        assert!(matches!(
            db.push_into_array("n", 2),
            Err(CoreError::InvalidValue { .. })
        ));
        assert!(matches!(
            db.remove_from_array("n", 2),
            Err(CoreError::InvalidValue { .. })
        ));
    }

    #[test]
    fn remove_from_array_uses_deep_equality() {
        let (mut db, _) = memory_db(Config::new());
        db.set("items", json!([{"id": 1}, {"id": 2}, {"id": 1}])).unwrap();

        db.remove_from_array("items", json!({"id": 1})).unwrap();

        assert_eq!(db.to_snapshot(), json!({"items": [{"id": 2}]}));
    }

    #[test]
    fn encryption_roundtrip() {
        let (mut db, _) = memory_db(Config::new().encryption_key(KEY));

        db.set_encrypted("secret", "hunter2").unwrap();

        let raw = db.get("secret").unwrap().unwrap();
        assert_ne!(raw.as_str(), Some("hunter2"));
        assert!(crate::crypto::is_token(raw.as_str().unwrap()));
        assert_eq!(db.get_decrypted("secret").unwrap(), "hunter2");
    }

    #[test]
    fn encryption_requires_key() {
        let (mut db, _) = memory_db(Config::new());

        assert!(matches!(
            db.set_encrypted("secret", "x"),
            Err(CoreError::MissingEncryptionKey)
        ));
        assert!(matches!(
            db.get_decrypted("secret"),
            Err(CoreError::MissingEncryptionKey)
        ));
    }

    #[test]
    fn encryption_with_short_key() {
        let (mut db, _) = memory_db(Config::new().encryption_key("short"));

        assert!(db.startup_error().is_none());
        assert!(matches!(
            db.set_encrypted("secret", "x"),
            Err(CoreError::InvalidKeySize {
                expected: 32,
                actual: 5
            })
        ));
        db.set("plain", 1).unwrap();
    }

    #[test]
    fn encrypting_non_strings_fails() {
        let (mut db, _) = memory_db(Config::new().encryption_key(KEY));

        assert!(matches!(
            db.set_encrypted("n", 1),
            Err(CoreError::InvalidValue { .. })
        ));
    }

    #[test]
    fn decrypting_plain_value_fails() {
        let (mut db, _) = memory_db(Config::new().encryption_key(KEY));
        db.set("plain", "not a token").unwrap();

        assert!(matches!(
            db.get_decrypted("plain"),
            Err(CoreError::DecryptionFailed)
        ));
        assert!(matches!(
            db.get_decrypted("missing"),
            Err(CoreError::DecryptionFailed)
        ));
    }

    #[test]
    fn captured_document_is_stable() {
        let (mut db, _) = memory_db(Config::new());
        db.set("a.b", 1).unwrap();

        let view = db.document();
        db.set("a.b", 2).unwrap();

        assert_eq!(view.to_json(), json!({"a": {"b": 1}}));
    }

    #[test]
    fn clean_empties_everything() {
        let (mut db, backend) = memory_db(Config::new());
        db.set("a", 1).unwrap();

        db.clean().unwrap();
        db.flush().unwrap();

        assert_eq!(db.to_snapshot(), json!({}));
        assert_eq!(persisted(&backend), json!({}));
    }

    #[test]
    fn manual_save_and_load() {
        let (mut db, backend) = memory_db(Config::new().auto_save(false));

        db.set("a", 1).unwrap();
        db.flush().unwrap();
        assert_eq!(backend.write_count(), 0);

        db.save().unwrap().wait().unwrap();
        assert_eq!(persisted(&backend), json!({"a": 1}));

        db.set("a", 2).unwrap();
        db.load().unwrap();
        assert_eq!(db.get("a").unwrap(), Some(Value::from(1)));
    }

    #[test]
    fn flush_surfaces_write_failures() {
        let (mut db, backend) = memory_db(Config::new());
        backend.set_fail_writes(true);

        db.set("a", 1).unwrap();

        assert!(matches!(db.flush(), Err(CoreError::Storage(_))));
    }

    #[test]
    fn open_creates_missing_file() {
        let dir = tempdir().unwrap();
        let db = file_db(&dir);
        db.flush().unwrap();

        assert!(db.startup_error().is_none());
        assert_eq!(fs::read(dir.path().join("db.json")).unwrap(), b"{}");
    }

    #[test]
    fn reopen_sees_persisted_data() {
        let dir = tempdir().unwrap();
        {
            let mut db = file_db(&dir);
            db.set("user.age", 30).unwrap();
            db.flush().unwrap();
        }

        let db = file_db(&dir);
        assert_eq!(db.get("user.age").unwrap(), Some(Value::from(30)));
    }

    #[test]
    fn wrong_extension_degrades() {
        let dir = tempdir().unwrap();
        let mut db = Database::open(Config::new().data_file(dir.path().join("db.txt")));

        assert!(db.startup_error().is_some());
        assert!(matches!(
            db.get("a"),
            Err(CoreError::Storage(StorageError::InvalidPath { .. }))
        ));
        assert!(matches!(
            db.set("a", 1),
            Err(CoreError::Storage(StorageError::InvalidPath { .. }))
        ));
        assert!(!dir.path().join("db.txt").exists());
    }

    #[test]
    fn corrupt_file_degrades() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("db.json"), b"[1, 2").unwrap();

        let db = file_db(&dir);

        assert!(matches!(db.get("a"), Err(CoreError::InvalidFormat { .. })));
    }

    #[test]
    fn collections_lifecycle() {
        let dir = tempdir().unwrap();
        let mut db = file_db(&dir);

        let users = db
            .create_collection("users", Defaults::new().auto_increment("id", 1))
            .unwrap();
        users.insert(crate::collection::Record::new()).unwrap();

        assert_eq!(db.collection_names(), vec!["users"]);
        assert_eq!(db.collection("users").unwrap().len(), 1);
        db.flush().unwrap();

        let file = dir.path().join("collections").join("users.json");
        let stored: serde_json::Value = serde_json::from_slice(&fs::read(&file).unwrap()).unwrap();
        assert_eq!(stored, json!([{"id": 1}]));

        db.delete_collection("users").unwrap();
        assert!(!file.exists());
        assert!(matches!(
            db.collection("users"),
            Err(CoreError::CollectionNotFound { .. })
        ));
    }

    #[test]
    fn collection_errors() {
        let dir = tempdir().unwrap();
        let mut db = file_db(&dir);
        db.create_collection("users", Defaults::new()).unwrap();

        assert!(matches!(
            db.create_collection("users", Defaults::new()),
            Err(CoreError::CollectionAlreadyExists { .. })
        ));
        assert!(matches!(
            db.create_collection("a..b", Defaults::new()),
            Err(CoreError::InvalidKey { .. })
        ));
        assert!(matches!(
            db.collection_mut("ghosts"),
            Err(CoreError::CollectionNotFound { .. })
        ));
        assert!(matches!(
            db.delete_collection("ghosts"),
            Err(CoreError::CollectionNotFound { .. })
        ));
    }

    #[test]
    fn collection_folder_must_be_directory() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("collections");
        fs::write(&folder, b"not a folder").unwrap();

        let mut db = file_db(&dir);

        assert!(matches!(
            db.create_collection("users", Defaults::new()),
            Err(CoreError::Storage(StorageError::InvalidPath { .. }))
        ));
    }

    #[test]
    fn sum_keeps_integers_exact() {
        assert_eq!(sum(&Value::from(1), 2.0), Value::from(3));
        assert_eq!(sum(&Value::from(1), 0.25), Value::from(1.25));
        assert_eq!(sum(&Value::from(1.5), 1.0), Value::from(2.5));
        assert_eq!(sum(&Value::from(i64::MAX), 1.0), Value::from(i64::MAX as f64 + 1.0));
    }
}
