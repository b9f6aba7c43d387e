//! # LightDB Storage
//!
//! Storage backend trait and the write-coalescing atomic store for LightDB.
//!
//! This crate provides the lowest-level persistence layer. Backends are
//! **opaque byte stores** holding one blob each - a serialized document or
//! collection - and never interpret what they store.
//!
//! ## Design Principles
//!
//! - Backends replace their whole contents atomically (write-then-rename)
//! - [`AtomicStore`] keeps at most one physical write in flight and collapses
//!   bursts of requests into a single follow-up write of the newest payload
//! - Every store is an explicit object owned by its user, never a global
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral storage
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use lightdb_storage::{AtomicStore, EmptyShape, InMemoryBackend};
//! use std::sync::Arc;
//!
//! let store = AtomicStore::new(Arc::new(InMemoryBackend::new()));
//! let ticket = store.write(b"{\"hello\":\"world\"}".to_vec());
//! ticket.wait().unwrap();
//! assert_eq!(store.read(EmptyShape::Object).unwrap(), b"{\"hello\":\"world\"}");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod atomic;
mod backend;
mod error;
mod file;
mod memory;

pub use atomic::{AtomicStore, EmptyShape, WriteTicket};
pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
