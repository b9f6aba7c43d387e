//! LightDB CLI
//!
//! Command-line tools for LightDB data files.
//!
//! # Commands
//!
//! - `inspect` - Display data file statistics
//! - `get` / `set` / `remove` - Read and modify values by dot-path key
//! - `dump` - Print the document or a collection
//! - `collections` - List collection files
//! - `version` - Show version information

mod commands;
mod error;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// LightDB command-line database tools.
#[derive(Parser)]
#[command(name = "lightdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the data file (overrides the config file)
    #[arg(global = true, short, long)]
    data_file: Option<PathBuf>,

    /// JSON configuration file (camelCase keys)
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// 32-byte key for encrypted values
    #[arg(global = true, short = 'k', long)]
    encryption_key: Option<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display data file statistics and top-level keys
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print the value stored at a key
    Get {
        /// Dot-path key
        key: String,

        /// Decrypt the stored value
        #[arg(long)]
        decrypt: bool,
    },

    /// Store a value at a key
    Set {
        /// Dot-path key
        key: String,

        /// JSON value; anything that is not valid JSON is stored as a string
        value: String,

        /// Encrypt the value (must be a string)
        #[arg(long)]
        encrypt: bool,
    },

    /// Delete the entry at a key
    Remove {
        /// Dot-path key
        key: String,
    },

    /// Print the whole document or one collection
    Dump {
        /// Collection to dump instead of the document
        #[arg(long)]
        collection: Option<String>,

        /// Print compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// List collection files and their record counts
    Collections,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Commands::Version = cli.command {
        println!("LightDB CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("LightDB Core v{}", lightdb_core::VERSION);
        return Ok(());
    }

    let config = commands::load_config(
        cli.config.as_deref(),
        cli.data_file,
        cli.encryption_key,
    )?;

    match cli.command {
        Commands::Inspect { format } => commands::inspect::run(config, &format)?,
        Commands::Get { key, decrypt } => commands::get::run(config, &key, decrypt)?,
        Commands::Set {
            key,
            value,
            encrypt,
        } => commands::set::run(config, &key, &value, encrypt)?,
        Commands::Remove { key } => commands::remove::run(config, &key)?,
        Commands::Dump {
            collection,
            compact,
        } => commands::dump::run(config, collection.as_deref(), compact)?,
        Commands::Collections => commands::collections::run(&config)?,
        Commands::Version => {}
    }

    Ok(())
}
