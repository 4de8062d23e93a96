//! Cancellable timers and deferred task scheduling
//!
//! Deferred work (the zero-delay post-set hand-off, the post-save reset) goes
//! through the [`TaskScheduler`] trait so tests can drive it with virtual
//! time instead of sleeping. The once-a-second session ticker is a
//! [`TokioScheduler::every`] loop.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{sleep, MissedTickBehavior};
use tracing::debug;

/// Work handed to a scheduler.
pub type ScheduledTask = Box<dyn FnOnce() + Send + 'static>;

/// Cancellation token shared between the caller and a scheduled task.
///
/// Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

impl TimerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the task. A task that already ran is unaffected.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Record that the task ran. Called by scheduler implementations.
    pub fn mark_finished(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }

    /// True once the task ran or was cancelled.
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.finished.load(Ordering::SeqCst)
    }
}

/// Runs a task once after a delay.
pub trait TaskScheduler: Send + Sync {
    /// Schedule `task` to run after `delay`. A zero delay defers the task
    /// until the caller has returned; it never runs inline.
    fn schedule(&self, delay: Duration, task: ScheduledTask) -> TimerHandle;
}

/// Scheduler backed by the tokio runtime.
#[derive(Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Bind to the runtime of the calling task.
    ///
    /// # Errors
    ///
    /// Returns an error when called outside a tokio runtime.
    pub fn current() -> Result<Self, tokio::runtime::TryCurrentError> {
        Handle::try_current().map(Self::new)
    }

    /// Call `callback` once per `period` until the handle is cancelled.
    ///
    /// The first call happens one `period` after this returns. Ticks missed
    /// while the runtime was starved are not replayed in a burst; elapsed
    /// time is recomputed from the wall clock instead.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::time::Duration;
    ///
    /// use liftlog_common::time::TokioScheduler;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let scheduler = TokioScheduler::current().unwrap();
    ///     let ticker = scheduler.every(Duration::from_secs(1), || {
    ///         println!("tick");
    ///     });
    ///
    ///     tokio::time::sleep(Duration::from_secs(5)).await;
    ///     ticker.cancel();
    /// }
    /// ```
    pub fn every<F>(&self, period: Duration, mut callback: F) -> TimerHandle
    where
        F: FnMut() + Send + 'static,
    {
        let handle = TimerHandle::new();
        let token = handle.clone();

        self.handle.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;

            let mut ticks: u64 = 0;
            while !token.is_cancelled() {
                interval.tick().await;
                if token.is_cancelled() {
                    break;
                }
                callback();
                ticks += 1;
            }
            debug!(ticks, period_ms = period.as_millis(), "recurring timer stopped");
            token.mark_finished();
        });

        handle
    }
}

impl fmt::Debug for TokioScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioScheduler").finish_non_exhaustive()
    }
}

impl TaskScheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: ScheduledTask) -> TimerHandle {
        let handle = TimerHandle::new();
        let token = handle.clone();

        self.handle.spawn(async move {
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                sleep(delay).await;
            }
            if !token.is_cancelled() {
                task();
                token.mark_finished();
            }
        });

        handle
    }
}
