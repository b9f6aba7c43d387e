//! Dump command implementation.

use super::{open, render};
use crate::error::{CliError, CliResult};
use lightdb_core::{path, Config, Defaults, Value};

/// Runs the dump command.
pub fn run(config: Config, collection: Option<&str>, compact: bool) -> CliResult<()> {
    let mut db = open(config)?;

    let value = match collection {
        None => db.document(),
        Some(name) => {
            path::validate(name)?;
            let file = db
                .config()
                .collections_folder
                .join(format!("{name}.{}", path::DATA_FILE_EXTENSION));
            if !file.is_file() {
                return Err(CliError::MissingCollection(file));
            }

            let records = db.create_collection(name, Defaults::new())?;
            Value::from(
                records
                    .all()
                    .iter()
                    .cloned()
                    .map(Value::from)
                    .collect::<Vec<_>>(),
            )
        }
    };

    println!("{}", render(&value, compact)?);
    Ok(())
}
