//! Get command implementation.

use super::{open, render};
use crate::error::CliResult;
use lightdb_core::Config;

/// Runs the get command.
pub fn run(config: Config, key: &str, decrypt: bool) -> CliResult<()> {
    let db = open(config)?;

    if decrypt {
        println!("{}", db.get_decrypted(key)?);
        return Ok(());
    }

    match db.get(key)? {
        Some(value) => println!("{}", render(&value, false)?),
        None => eprintln!("No value at {key:?}"),
    }
    Ok(())
}
