//! # LightDB Testkit
//!
//! Test utilities for LightDB.
//!
//! This crate provides:
//! - Test fixtures and database helpers
//! - Property-based test generators using proptest
//! - Stress helpers for write bursts and coalescing
//!
//! ## Usage
//!
//! ```rust
//! use lightdb_testkit::prelude::*;
//!
//! with_temp_db(|db| {
//!     db.set("greeting", "hello").unwrap();
//!     assert!(db.has("greeting").unwrap());
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
