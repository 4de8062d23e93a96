//! Time utilities and abstractions
//!
//! - **Clock abstractions**: real and mock wall-clock time (re-exported from
//!   testing)
//! - **[`timer`]**: cancellable timer handles, the [`TaskScheduler`] seam and
//!   its tokio implementation
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//!
//! use liftlog_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::at_millis(1_000);
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.now_millis(), 6_000);
//! ```

pub mod timer;

use chrono::{DateTime, TimeZone, Utc};

// Re-export commonly used items
pub use timer::{ScheduledTask, TaskScheduler, TimerHandle, TokioScheduler};

// Re-export Clock abstractions from testing module
pub use crate::testing::time::{Clock, MockClock, SystemClock};

/// Convert milliseconds since the UNIX epoch to a UTC timestamp.
///
/// Out-of-range values clamp to the epoch.
pub fn millis_to_utc(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
}
