//! Database configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default location of the root data file.
pub const DEFAULT_DATA_FILE: &str = "./lightdb.json";
/// Default folder holding one file per collection.
pub const DEFAULT_COLLECTIONS_FOLDER: &str = "./db-collections";
/// Default indentation of the persisted JSON.
pub const DEFAULT_TAB_SIZE: usize = 2;

/// Configuration for opening a database.
///
/// Can be built in code or deserialized from JSON using camelCase keys:
///
/// ```json
/// { "dataFile": "./app.json", "autoSave": false, "tabSize": 4 }
/// ```
#[derive(Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Path of the root data file. Must have a `.json` extension.
    pub data_file: PathBuf,

    /// Folder holding one `<name>.json` file per collection.
    pub collections_folder: PathBuf,

    /// Whether to persist after every mutating call.
    pub auto_save: bool,

    /// 32-byte key required for encrypted values.
    pub encryption_key: Option<String>,

    /// Indentation width of the persisted JSON (0 = compact).
    pub tab_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            collections_folder: PathBuf::from(DEFAULT_COLLECTIONS_FOLDER),
            auto_save: true,
            encryption_key: None,
            tab_size: DEFAULT_TAB_SIZE,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root data file path.
    #[must_use]
    pub fn data_file(mut self, path: impl AsRef<Path>) -> Self {
        self.data_file = path.as_ref().to_path_buf();
        self
    }

    /// Sets the collections folder.
    #[must_use]
    pub fn collections_folder(mut self, path: impl AsRef<Path>) -> Self {
        self.collections_folder = path.as_ref().to_path_buf();
        self
    }

    /// Sets whether every mutation is persisted immediately.
    #[must_use]
    pub const fn auto_save(mut self, value: bool) -> Self {
        self.auto_save = value;
        self
    }

    /// Sets the encryption key.
    #[must_use]
    pub fn encryption_key(mut self, key: impl Into<String>) -> Self {
        self.encryption_key = Some(key.into());
        self
    }

    /// Sets the JSON indentation width.
    #[must_use]
    pub const fn tab_size(mut self, width: usize) -> Self {
        self.tab_size = width;
        self
    }

    /// Parses a configuration from JSON.
    ///
    /// Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or has wrongly typed fields.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("data_file", &self.data_file)
            .field("collections_folder", &self.collections_folder)
            .field("auto_save", &self.auto_save)
            .field(
                "encryption_key",
                &self.encryption_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("tab_size", &self.tab_size)
            .finish()
    }
}
