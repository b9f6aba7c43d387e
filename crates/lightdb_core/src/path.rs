//! Dot-path keys and on-disk location checks.
//!
//! A key such as `"user.address.city"` addresses a nested field through the
//! segments `["user", "address", "city"]`. Keys must be non-empty and must
//! not start or end with a dot or contain two consecutive dots, so every
//! segment is non-empty.

use crate::error::{CoreError, CoreResult};
use std::fs;
use std::io;
use std::path::Path;

/// Extension required for the root data file.
pub const DATA_FILE_EXTENSION: &str = "json";

/// Returns true if `key` is a well-formed dot-path.
#[must_use]
pub fn is_valid(key: &str) -> bool {
    !key.is_empty() && !key.starts_with('.') && !key.ends_with('.') && !key.contains("..")
}

/// Checks that `key` is a well-formed dot-path.
///
/// # Errors
///
/// Returns [`CoreError::InvalidKey`] for empty keys, leading or trailing
/// dots, and consecutive dots.
pub fn validate(key: &str) -> CoreResult<()> {
    if is_valid(key) {
        Ok(())
    } else {
        Err(CoreError::invalid_key(key))
    }
}

/// Splits a validated key into its segments.
#[must_use]
pub fn split(key: &str) -> Vec<&str> {
    key.split('.').collect()
}

/// Validates `key` and splits it into segments.
///
/// # Errors
///
/// Returns [`CoreError::InvalidKey`] if the key is malformed.
pub fn parse(key: &str) -> CoreResult<Vec<&str>> {
    validate(key)?;
    Ok(split(key))
}

/// Result of probing a data file or folder location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    /// The location exists and is usable.
    Ready,
    /// Nothing exists at the location yet.
    Missing,
    /// The location exists but cannot be accessed.
    AccessDenied,
    /// A data file path without the `.json` extension.
    WrongExtension,
    /// A folder path that points at something other than a directory.
    NotADirectory,
}

/// Probes the root data file location.
///
/// Other I/O failures report [`PathStatus::Ready`]; the subsequent read
/// surfaces the real error.
#[must_use]
pub fn check_data_file(path: &Path) -> PathStatus {
    if path.extension().and_then(|e| e.to_str()) != Some(DATA_FILE_EXTENSION) {
        return PathStatus::WrongExtension;
    }

    match fs::symlink_metadata(path) {
        Ok(_) => PathStatus::Ready,
        Err(e) => classify(&e),
    }
}

/// Probes the collections folder location.
#[must_use]
pub fn check_folder(path: &Path) -> PathStatus {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => PathStatus::Ready,
        Ok(_) => PathStatus::NotADirectory,
        Err(e) => classify(&e),
    }
}

fn classify(err: &io::Error) -> PathStatus {
    match err.kind() {
        io::ErrorKind::NotFound => PathStatus::Missing,
        io::ErrorKind::PermissionDenied => PathStatus::AccessDenied,
        _ => PathStatus::Ready,
    }
}
