//! Wall-clock seam
//!
//! Session timestamps are milliseconds since the UNIX epoch. The [`Clock`]
//! trait lets the session engine read them from either the system clock or a
//! [`MockClock`] that tests move by hand.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use liftlog_common::testing::{Clock, MockClock, SystemClock};
//!
//! assert!(SystemClock.now_millis() > 0);
//!
//! let mock = MockClock::at_millis(10_000);
//! mock.advance(Duration::from_secs(5));
//! assert_eq!(mock.now_millis(), 15_000);
//! ```

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

use crate::time::millis_to_utc;

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    /// Milliseconds since the UNIX epoch.
    fn now_millis(&self) -> i64;

    fn now_utc(&self) -> DateTime<Utc> {
        millis_to_utc(self.now_millis())
    }
}

/// Reads the operating system clock. Times before the epoch read as 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        i64::try_from(since_epoch.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Hand-driven clock.
///
/// Clones share one reading, so a clone handed to the code under test moves
/// when the test advances its own copy.
#[derive(Debug, Clone)]
pub struct MockClock {
    millis: Arc<AtomicI64>,
    start: i64,
}

impl MockClock {
    /// Start at the current system time.
    pub fn new() -> Self {
        Self::from_millis(SystemClock.now_millis())
    }

    pub fn at_millis(millis: u64) -> Self {
        Self::from_millis(i64::try_from(millis).unwrap_or(i64::MAX))
    }

    fn from_millis(millis: i64) -> Self {
        Self { millis: Arc::new(AtomicI64::new(millis)), start: millis }
    }

    pub fn advance(&self, duration: Duration) {
        let step = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        let _ = self
            .millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| Some(now.saturating_add(step)));
    }

    /// Jump to an absolute reading. Moving backwards is allowed, which is
    /// how tests simulate clock skew.
    pub fn set_millis(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    /// Virtual time since the clock was created. Zero if it was set back
    /// before its start.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        let delta = self.millis.load(Ordering::SeqCst).saturating_sub(self.start);
        Duration::from_millis(u64::try_from(delta).unwrap_or(0))
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}
