//! # Liftlog Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - Key/value snapshot storage (file-backed and in-memory)
//! - SQLite workout backend and retry queue (rusqlite + r2d2)
//! - Notification and user-context adapters
//! - Configuration loading and tracing bootstrap
//! - The [`AppContext`] composition root
//!
//! ## Architecture
//! - Implements traits defined in `liftlog-core`
//! - Contains all "impure" code (I/O, clocks, runtime)

pub mod config;
pub mod context;
pub mod database;
pub mod errors;
pub mod notifications;
pub mod observability;
pub mod storage;
pub mod user;

// Re-export commonly used items
pub use context::AppContext;
pub use database::{DbManager, SqliteRetryQueue, SqliteWorkoutBackend};
pub use errors::InfraError;
pub use notifications::TracingNotifier;
pub use observability::{init_tracing, LogFormat};
pub use storage::{FileKeyValueStorage, MemoryKeyValueStorage};
pub use user::StaticUserContext;
