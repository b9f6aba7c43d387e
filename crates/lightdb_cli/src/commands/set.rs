//! Set command implementation.

use super::{open, parse_value, render};
use crate::error::CliResult;
use lightdb_core::{Config, Value};
use tracing::info;

/// Runs the set command.
///
/// With `encrypt`, the raw argument is encrypted as a string.
pub fn run(config: Config, key: &str, value: &str, encrypt: bool) -> CliResult<()> {
    let mut db = open(config)?;

    let state = if encrypt {
        db.set_encrypted(key, value)?
    } else {
        db.set(key, parse_value(value))?
    };
    if !db.config().auto_save {
        db.save()?;
    }
    db.flush()?;

    info!(key, path = %db.path().display(), "value stored");
    println!("{}", render(&state.unwrap_or(Value::Null), false)?);
    Ok(())
}
