//! Inspect command implementation.

use super::open;
use crate::error::CliResult;
use lightdb_core::{Config, Value};
use serde::Serialize;
use std::fs;

/// Data file inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Data file path.
    pub path: String,
    /// Data file size in bytes.
    pub file_size: u64,
    /// Number of top-level keys.
    pub key_count: usize,
    /// Whether mutations are saved automatically.
    pub auto_save: bool,
    /// Whether an encryption key is configured.
    pub encryption: bool,
    /// Top-level keys and the type of their values.
    pub keys: Vec<KeyStats>,
}

/// Statistics for a single top-level key.
#[derive(Debug, Serialize)]
pub struct KeyStats {
    /// Key name.
    pub key: String,
    /// JSON type of the value.
    pub kind: &'static str,
    /// Number of entries for objects and arrays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<usize>,
}

/// Runs the inspect command.
pub fn run(config: Config, format: &str) -> CliResult<()> {
    let db = open(config)?;
    db.flush()?;

    let document = db.document();
    let keys = document
        .as_object()
        .map(|fields| {
            fields
                .iter()
                .map(|(key, value)| KeyStats {
                    key: key.clone(),
                    kind: value.type_name(),
                    entries: entry_count(value),
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let result = InspectResult {
        path: db.path().display().to_string(),
        file_size: fs::metadata(db.path()).map(|m| m.len()).unwrap_or(0),
        key_count: keys.len(),
        auto_save: db.config().auto_save,
        encryption: db.config().encryption_key.is_some(),
        keys,
    };

    // Output
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn entry_count(value: &Value) -> Option<usize> {
    match value {
        Value::Object(fields) => Some(fields.len()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn print_text_output(result: &InspectResult) {
    println!("Data file: {}", result.path);
    println!("Size:      {} bytes", result.file_size);
    println!("Keys:      {}", result.key_count);
    println!("Auto-save: {}", result.auto_save);
    println!("Encryption key: {}", if result.encryption { "configured" } else { "none" });

    if !result.keys.is_empty() {
        println!();
        for stats in &result.keys {
            match stats.entries {
                Some(n) => println!("  {:<24} {:<8} {n} entries", stats.key, stats.kind),
                None => println!("  {:<24} {}", stats.key, stats.kind),
            }
        }
    }
}
