//! Time and scheduling utilities shared across Liftlog crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: pure helpers (epoch conversions)
//! - `runtime`: clocks, timer handles and task schedulers
//! - `test-utils`: deterministic doubles (`MockClock`, `ManualScheduler`)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod time;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "runtime", feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use time::{
    millis_to_utc, Clock, ScheduledTask, SystemClock, TaskScheduler, TimerHandle,
    TokioScheduler,
};
