//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `LIFTLOG_DB_PATH` is unset, falls back to loading from file
//! 3. Probes multiple paths for config files (JSON or TOML)
//! 4. With no file anywhere, uses [`Config::default`]
//!
//! ## Environment Variables
//! - `LIFTLOG_DB_PATH`: Database file path (required for env loading)
//! - `LIFTLOG_DB_POOL_SIZE`: Connection pool size
//! - `LIFTLOG_STORAGE_DIR`: Directory for the session snapshot
//! - `LIFTLOG_USER_ID`: Signed-in user
//! - `LIFTLOG_SAVED_RESET_DELAY_MS`: Grace period before the post-save reset
//! - `LIFTLOG_DEFAULT_REST_SECONDS`: Rest time for newly added sets
//!
//! ## File Locations
//! The loader probes `liftlog.{json,toml}` then `config.{json,toml}` in the
//! current directory, then next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use liftlog_domain::{Config, LiftlogError, Result};

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `LiftlogError::Config` if an environment value or a found config
/// file is invalid. A missing file is not an error.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            match probe_config_paths() {
                Some(path) => load_from_file(Some(path)),
                None => {
                    tracing::info!("No config file found, using defaults");
                    Ok(Config::default())
                }
            }
        }
    }
}

/// Load configuration from environment variables
///
/// `LIFTLOG_DB_PATH` must be set; every other variable is optional and
/// falls back to its default.
///
/// # Errors
/// Returns `LiftlogError::Config` if the database path is missing or a
/// numeric variable does not parse.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.database.path = env_var("LIFTLOG_DB_PATH")?;
    if let Some(pool_size) = env_parse::<u32>("LIFTLOG_DB_POOL_SIZE")? {
        config.database.pool_size = pool_size;
    }
    if let Ok(dir) = std::env::var("LIFTLOG_STORAGE_DIR") {
        config.storage.dir = dir;
    }
    config.user.user_id = std::env::var("LIFTLOG_USER_ID").ok().filter(|id| !id.is_empty());
    if let Some(delay) = env_parse::<u64>("LIFTLOG_SAVED_RESET_DELAY_MS")? {
        config.session.saved_reset_delay_ms = delay;
    }
    if let Some(rest) = env_parse::<u32>("LIFTLOG_DEFAULT_REST_SECONDS")? {
        config.session.default_rest_seconds = rest;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `LiftlogError::Config` if the file is missing, unreadable or
/// not valid JSON/TOML.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(LiftlogError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            LiftlogError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| LiftlogError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration; format is detected by file extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| LiftlogError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| LiftlogError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(LiftlogError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["liftlog.json", "liftlog.toml", "config.json", "config.toml"];

    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }

    dirs.iter().flat_map(|dir| NAMES.iter().map(move |name| dir.join(name))).find(|p| p.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| LiftlogError::Config(format!("Missing required environment variable: {key}")))
}

/// Parse an optional environment variable. Unset is `Ok(None)`.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| LiftlogError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}
