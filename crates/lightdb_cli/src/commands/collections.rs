//! Collections command implementation.

use crate::error::{CliError, CliResult};
use lightdb_core::path::{self, PathStatus};
use lightdb_core::{codec, Config, Value};
use std::fs;
use std::path::Path;

/// Summary of one collection file.
#[derive(Debug)]
pub struct CollectionSummary {
    /// Collection name (file stem).
    pub name: String,
    /// Number of records, or `None` if the file is not a valid collection.
    pub records: Option<usize>,
    /// File size in bytes.
    pub size: u64,
}

/// Runs the collections command.
pub fn run(config: &Config) -> CliResult<()> {
    let folder = &config.collections_folder;
    if path::check_folder(folder) != PathStatus::Ready {
        println!("No collections folder at {}", folder.display());
        return Ok(());
    }

    let summaries = scan(folder)?;
    if summaries.is_empty() {
        println!("No collections in {}", folder.display());
    }
    for summary in summaries {
        match summary.records {
            Some(count) => println!("{:<24} {:>8} records {:>10} bytes", summary.name, count, summary.size),
            None => println!("{:<24} {:>8} {:>10} bytes", summary.name, "invalid", summary.size),
        }
    }
    Ok(())
}

/// Reads every `*.json` file in `folder`, sorted by name.
pub fn scan(folder: &Path) -> CliResult<Vec<CollectionSummary>> {
    let io_error = |source| CliError::Io {
        path: folder.to_path_buf(),
        source,
    };

    let mut summaries = Vec::new();
    for entry in fs::read_dir(folder).map_err(io_error)? {
        let file = entry.map_err(io_error)?.path();
        if file.extension().and_then(|e| e.to_str()) != Some(path::DATA_FILE_EXTENSION) {
            continue;
        }
        let Some(name) = file.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let bytes = fs::read(&file).map_err(|source| CliError::Io {
            path: file.clone(),
            source,
        })?;
        let records = codec::decode::<Value>(&bytes)
            .ok()
            .and_then(|value| value.as_array().map(<[Value]>::len));

        summaries.push(CollectionSummary {
            name: name.to_string(),
            records,
            size: bytes.len() as u64,
        });
    }

    summaries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(summaries)
}
