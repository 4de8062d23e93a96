//! Virtual-time scheduler for deterministic tests
//!
//! [`ManualScheduler`] queues tasks instead of spawning them. Tests call
//! [`ManualScheduler::advance`] (optionally together with a [`MockClock`]) to
//! run whatever became due, in due-time order.
//!
//! ```
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use liftlog_common::testing::ManualScheduler;
//! use liftlog_common::time::TaskScheduler;
//!
//! let scheduler = ManualScheduler::new();
//! let hits = Arc::new(AtomicU32::new(0));
//! let hits_clone = hits.clone();
//! scheduler.schedule(Duration::from_millis(100), Box::new(move || {
//!     hits_clone.fetch_add(1, Ordering::SeqCst);
//! }));
//!
//! scheduler.advance(Duration::from_millis(99));
//! assert_eq!(hits.load(Ordering::SeqCst), 0);
//! scheduler.advance(Duration::from_millis(1));
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```
//!
//! [`MockClock`]: super::MockClock

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::time::MockClock;
use crate::time::{ScheduledTask, TaskScheduler, TimerHandle};

struct Pending {
    due: Duration,
    seq: u64,
    handle: TimerHandle,
    task: ScheduledTask,
}

#[derive(Default)]
struct Queue {
    now: Duration,
    next_seq: u64,
    pending: Vec<Pending>,
}

/// Scheduler that only runs tasks when told to.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Arc<Mutex<Queue>>,
    clock: Option<MockClock>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `clock` in step with virtual time: every [`advance`] also
    /// advances the clock.
    ///
    /// [`advance`]: Self::advance
    pub fn with_clock(clock: MockClock) -> Self {
        Self { queue: Arc::default(), clock: Some(clock) }
    }

    /// Move virtual time forward and run every task that became due,
    /// including tasks scheduled by those tasks. Returns how many ran.
    pub fn advance(&self, by: Duration) -> usize {
        if let Some(clock) = &self.clock {
            clock.advance(by);
        }
        self.queue.lock().now += by;

        let mut ran = 0;
        // Tasks run outside the lock so they may schedule more work.
        while let Some(next) = self.pop_due() {
            if !next.handle.is_cancelled() {
                (next.task)();
                next.handle.mark_finished();
                ran += 1;
            }
        }
        ran
    }

    /// Run tasks that are already due without moving time.
    pub fn run_pending(&self) -> usize {
        self.advance(Duration::ZERO)
    }

    /// Number of queued tasks that have not been cancelled.
    pub fn pending(&self) -> usize {
        self.queue.lock().pending.iter().filter(|p| !p.handle.is_cancelled()).count()
    }

    fn pop_due(&self) -> Option<Pending> {
        let mut queue = self.queue.lock();
        let now = queue.now;
        let idx = queue
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= now)
            .min_by_key(|(_, p)| (p.due, p.seq))
            .map(|(idx, _)| idx)?;
        Some(queue.pending.swap_remove(idx))
    }
}

impl TaskScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: ScheduledTask) -> TimerHandle {
        let handle = TimerHandle::new();
        let mut queue = self.queue.lock();
        let due = queue.now + delay;
        let seq = queue.next_seq;
        queue.next_seq += 1;
        queue.pending.push(Pending { due, seq, handle: handle.clone(), task });
        handle
    }
}
