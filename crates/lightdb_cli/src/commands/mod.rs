//! CLI command implementations.

pub mod collections;
pub mod dump;
pub mod get;
pub mod inspect;
pub mod remove;
pub mod set;

use crate::error::{CliError, CliResult};
use lightdb_core::{Config, Database, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Builds the configuration from an optional config file and overrides.
pub fn load_config(
    config_file: Option<&Path>,
    data_file: Option<PathBuf>,
    encryption_key: Option<String>,
) -> CliResult<Config> {
    let mut config = match config_file {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| CliError::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            Config::from_json(&text).map_err(|e| CliError::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        }
        None => Config::default(),
    };

    if let Some(path) = data_file {
        config = config.data_file(path);
    }
    if let Some(key) = encryption_key {
        config = config.encryption_key(key);
    }
    Ok(config)
}

/// Opens the database, turning a degraded start into an error.
pub fn open(config: Config) -> CliResult<Database> {
    let db = Database::open(config);
    if let Some(e) = db.startup_error() {
        return Err(CliError::Unavailable {
            path: db.path().to_path_buf(),
            source: e.clone(),
        });
    }
    Ok(db)
}

/// Parses a command-line value as JSON, falling back to a plain string.
pub fn parse_value(text: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(text)
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(text))
}

/// Renders a value as JSON text.
pub fn render(value: &Value, compact: bool) -> CliResult<String> {
    let json = value.to_json();
    let text = if compact {
        serde_json::to_string(&json)?
    } else {
        serde_json::to_string_pretty(&json)?
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_value_accepts_json() {
        assert_eq!(parse_value("42"), Value::from(42));
        assert_eq!(parse_value("true"), Value::from(true));
        assert_eq!(
            parse_value(r#"{"a": [1]}"#),
            Value::from(serde_json::json!({"a": [1]}))
        );
    }

    #[test]
    fn parse_value_falls_back_to_string() {
        assert_eq!(parse_value("hello world"), Value::from("hello world"));
        assert_eq!(parse_value("{broken"), Value::from("{broken"));
    }

    #[test]
    fn config_file_with_overrides() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("lightdb.config.json");
        fs::write(&file, r#"{"dataFile": "from-file.json", "tabSize": 0}"#).unwrap();

        let config = load_config(Some(&file), None, None).unwrap();
        assert_eq!(config.data_file, PathBuf::from("from-file.json"));
        assert_eq!(config.tab_size, 0);

        let config = load_config(
            Some(&file),
            Some(PathBuf::from("override.json")),
            Some("k".repeat(32)),
        )
        .unwrap();
        assert_eq!(config.data_file, PathBuf::from("override.json"));
        assert!(config.encryption_key.is_some());
    }

    #[test]
    fn bad_config_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("bad.json");
        fs::write(&file, "not json").unwrap();

        assert!(matches!(
            load_config(Some(&file), None, None),
            Err(CliError::Config { .. })
        ));
        assert!(matches!(
            load_config(Some(&dir.path().join("missing.json")), None, None),
            Err(CliError::Config { .. })
        ));
    }

    #[test]
    fn open_rejects_degraded_database() {
        let dir = tempdir().unwrap();
        let config = Config::new().data_file(dir.path().join("data.txt"));

        assert!(matches!(open(config), Err(CliError::Unavailable { .. })));
    }
}
