// Configuration loading and parsing (config/madness.toml).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Contents written to `config/madness.toml` when it does not exist yet.
pub const DEFAULT_CONFIG: &str = include_str!("../defaults/madness.toml");

const CONFIG_FILE: &str = "madness.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Resolved SQLite path (never empty).
    pub db_path: String,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub directory: String,
    pub filter: String,
}

// ---------------------------------------------------------------------------
// madness.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    database: DatabaseSection,
    logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    #[serde(default)]
    path: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Parse configuration text. `path` is only used in error messages.
pub fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let file: ConfigFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let db_path = if file.database.path.trim().is_empty() {
        default_db_path()?
    } else {
        file.database.path
    };

    let config = Config {
        db_path,
        logging: file.logging,
    };
    validate(&config)?;
    Ok(config)
}

/// Load and validate `config/madness.toml` relative to `base_dir`.
///
/// This does not create missing files; prefer `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = std::fs::read_to_string(&path)
        .map_err(|_| ConfigError::FileNotFound { path: path.clone() })?;
    parse_config(&text, &path)
}

/// Write the default config into `base_dir/config/` if it is missing.
/// Returns the files that were created.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let config_dir = base_dir.join("config");
    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let target = config_dir.join(CONFIG_FILE);
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(mut dest) => {
            std::io::Write::write_all(&mut dest, DEFAULT_CONFIG.as_bytes()).map_err(|e| {
                ConfigError::DefaultsCopyError {
                    message: format!("failed to write {}: {e}", target.display()),
                }
            })?;
            Ok(vec![target])
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(vec![]),
        Err(e) => Err(ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", target.display()),
        }),
    }
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures the default config file exists before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

/// `<platform data dir>/madness.db`, creating the directory if needed.
fn default_db_path() -> Result<String, ConfigError> {
    let dirs = directories::ProjectDirs::from("org", "madness", "madness").ok_or_else(|| {
        ConfigError::ValidationError {
            field: "database.path".into(),
            message: "empty and no home directory to default to".into(),
        }
    })?;
    let data_dir = dirs.data_dir();
    std::fs::create_dir_all(data_dir).map_err(|e| ConfigError::ValidationError {
        field: "database.path".into(),
        message: format!("cannot create {}: {e}", data_dir.display()),
    })?;
    Ok(data_dir.join("madness.db").to_string_lossy().into_owned())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.logging.filter.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "logging.filter".into(),
            message: "must not be empty".into(),
        });
    }
    if config.logging.directory.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "logging.directory".into(),
            message: "must not be empty".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn defaults_parse_and_validate() {
        let config = parse_config(DEFAULT_CONFIG, Path::new("defaults/madness.toml"))
            .expect("defaults should be valid");
        assert_eq!(config.db_path, "madness.db");
        assert_eq!(config.logging.directory, "logs");
        assert!(config.logging.filter.contains("madness_core=info"));
    }

    #[test]
    fn ensure_config_files_writes_once() {
        let tmp = scratch_dir("madness_config_ensure");

        let created = ensure_config_files(&tmp).unwrap();
        assert_eq!(created, vec![tmp.join("config").join("madness.toml")]);

        let again = ensure_config_files(&tmp).unwrap();
        assert!(again.is_empty());

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.db_path, "madness.db");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn existing_config_is_not_overwritten() {
        let tmp = scratch_dir("madness_config_keep");
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(
            tmp.join("config/madness.toml"),
            "[database]\npath = \"pool.db\"\n[logging]\ndirectory = \"out\"\nfilter = \"debug\"\n",
        )
        .unwrap();

        ensure_config_files(&tmp).unwrap();
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.db_path, "pool.db");
        assert_eq!(config.logging.directory, "out");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_file_is_reported() {
        let tmp = scratch_dir("madness_config_missing");
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = parse_config("[database\npath = 1", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn rejects_empty_log_filter() {
        let text = "[database]\npath = \"x.db\"\n[logging]\ndirectory = \"logs\"\nfilter = \"  \"\n";
        let err = parse_config(text, Path::new("madness.toml")).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "logging.filter"),
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }
}
