//! # LightDB Core
//!
//! Embedded JSON document database for LightDB.
//!
//! This crate provides:
//! - A root document addressed by dot-path keys (`"user.address.city"`)
//! - Copy-on-write document updates with cheap, stable views
//! - Opt-in AES-256-CTR encryption of individual string values
//! - Record collections with auto-increment defaults
//! - Coalesced, atomic persistence through [`lightdb_storage`]
//!
//! ## Example
//!
//! ```rust
//! use lightdb_core::{Database, Value};
//!
//! let mut db = Database::open_in_memory();
//!
//! db.set("user.name", "ann").unwrap();
//! db.add("user.visits", 1.0).unwrap();
//! db.push_into_array("user.tags", "admin").unwrap();
//!
//! assert_eq!(db.get("user.visits").unwrap(), Some(Value::from(1)));
//! db.flush().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod collection;
mod config;
pub mod crypto;
mod database;
mod document;
mod error;
pub mod path;
mod value;

pub use collection::{Collection, Defaults, Record};
pub use config::{Config, DEFAULT_COLLECTIONS_FOLDER, DEFAULT_DATA_FILE, DEFAULT_TAB_SIZE};
pub use database::Database;
pub use document::Document;
pub use error::{CoreError, CoreResult};
pub use value::{Map, Value};

// Re-export storage types that users may need
pub use lightdb_storage::{StorageBackend, StorageError, WriteTicket};

/// Version of the LightDB library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
