//! Remove command implementation.

use super::open;
use crate::error::CliResult;
use lightdb_core::Config;

/// Runs the remove command.
pub fn run(config: Config, key: &str) -> CliResult<()> {
    let mut db = open(config)?;

    let removed = db.remove(key)?;
    if removed && !db.config().auto_save {
        db.save()?;
    }
    db.flush()?;

    if removed {
        println!("Removed {key:?}");
    } else {
        println!("Nothing stored at {key:?}");
    }
    Ok(())
}
