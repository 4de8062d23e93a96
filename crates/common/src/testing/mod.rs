//! Testing utilities and helpers
//!
//! - **[`time`]**: the [`Clock`] seam plus a hand-driven [`MockClock`]
//! - **[`scheduler`]**: [`ManualScheduler`], a virtual-time [`TaskScheduler`]
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//!
//! use liftlog_common::testing::{ManualScheduler, MockClock};
//!
//! let clock = MockClock::at_millis(0);
//! let scheduler = ManualScheduler::with_clock(clock.clone());
//! scheduler.advance(Duration::from_secs(5));
//! assert_eq!(clock.elapsed(), Duration::from_secs(5));
//! ```
//!
//! [`TaskScheduler`]: crate::time::TaskScheduler

pub mod scheduler;
pub mod time;

// Re-export commonly used items
pub use scheduler::ManualScheduler;
pub use time::{Clock, MockClock, SystemClock};
