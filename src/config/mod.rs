//! Configuration loading
//!
//! The config file is JSON5 at `$QOTD_CONFIG_PATH`, or
//! `<config dir>/qotd/config.json5` when the variable is unset. A missing
//! file yields the defaults. A handful of environment variables override
//! file values.

pub mod types;

pub use types::{LoggingConfig, QotdConfig, ValidationError};

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const CONFIG_PATH_ENV: &str = "QOTD_CONFIG_PATH";
pub const DATA_DIR_ENV: &str = "QOTD_DATA_DIR";
pub const LOG_LEVEL_ENV: &str = "QOTD_LOG_LEVEL";
pub const DEVELOPER_ID_ENV: &str = "QOTD_DEVELOPER_ID";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid config: {}", join_issues(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_issues(issues: &[ValidationError]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Resolve the config file path
pub fn get_config_path() -> PathBuf {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    default_config_path()
}

/// `~/.config/qotd/config.json5`, or `.config/qotd/config.json5` without a home directory
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("qotd")
        .join("config.json5")
}

/// Load, apply environment overrides, and validate.
pub fn load_config() -> Result<QotdConfig, ConfigError> {
    let path = get_config_path();
    let mut config = load_config_uncached(&path)?;
    apply_env_overrides(&mut config, |key| env::var(key).ok());
    config.validate().map_err(ConfigError::Invalid)?;
    Ok(config)
}

/// Parse the file at `path` without overrides or validation.
pub fn load_config_uncached(path: &Path) -> Result<QotdConfig, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(QotdConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    parse_config(&raw).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse a JSON5 document; empty input yields the defaults.
pub fn parse_config(raw: &str) -> Result<QotdConfig, String> {
    if raw.trim().is_empty() {
        return Ok(QotdConfig::default());
    }
    json5::from_str::<QotdConfig>(raw).map_err(|e| e.to_string())
}

/// Apply `QOTD_*` overrides. `lookup` is `std::env::var` outside tests.
pub fn apply_env_overrides(config: &mut QotdConfig, lookup: impl Fn(&str) -> Option<String>) {
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(dir) = lookup(DATA_DIR_ENV) {
        config.data_dir = PathBuf::from(dir);
    }
    if let Some(level) = lookup(LOG_LEVEL_ENV) {
        config.logging.level = level;
    }
    if let Some(developer) = lookup(DEVELOPER_ID_ENV) {
        config.developer_id = Some(developer);
    }
}
