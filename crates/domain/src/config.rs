//! Configuration structures
//!
//! Loaded by `liftlog_infra::config::loader` from the environment or a
//! JSON/TOML file. Every section has defaults so a partial file is valid.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_REST_SECONDS, DEFAULT_SAVED_RESET_DELAY_MS, DEFAULT_SNAPSHOT_KEY,
};

/// Root application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub user: UserConfig,
}

/// Workout session behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Grace period between a confirmed save and the session wipe, so the UI
    /// can show the success state.
    pub saved_reset_delay_ms: u64,
    /// Key under which the session snapshot is written.
    pub snapshot_key: String,
    /// Rest time for sets created without an explicit target.
    pub default_rest_seconds: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            saved_reset_delay_ms: DEFAULT_SAVED_RESET_DELAY_MS,
            snapshot_key: DEFAULT_SNAPSHOT_KEY.to_string(),
            default_rest_seconds: DEFAULT_REST_SECONDS,
        }
    }
}

/// SQLite backend settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "liftlog.db".to_string(), pool_size: 4 }
    }
}

/// Key/value snapshot storage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { dir: ".liftlog".to_string() }
    }
}

/// Signed-in user. `None` means saves are rejected before any backend call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub user_id: Option<String>,
}
