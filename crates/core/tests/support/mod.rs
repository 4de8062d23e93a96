//! Shared test helpers for `liftlog-core` integration tests.
//!
//! [`Harness`] wires a store and coordinator to in-memory ports, a mock clock
//! and a manual scheduler so tests can advance virtual time.

#![allow(dead_code)]

pub mod ports;

use std::sync::Arc;
use std::time::Duration;

use liftlog_common::testing::{ManualScheduler, MockClock};
use liftlog_core::{SaveCoordinator, WorkoutStore};
use liftlog_domain::{ExerciseSet, SessionConfig, WorkoutExercises};
pub use ports::{FixedUser, MemoryRetryQueue, MemoryStorage, RecordingNotifier, ScriptedBackend};

/// 2023-11-14T22:13:20Z
pub const T0_MILLIS: u64 = 1_700_000_000_000;
pub const USER_ID: &str = "user-1";

pub struct Harness {
    pub store: WorkoutStore,
    pub coordinator: SaveCoordinator,
    pub clock: MockClock,
    pub scheduler: ManualScheduler,
    pub storage: MemoryStorage,
    pub notifier: RecordingNotifier,
    pub backend: ScriptedBackend,
    pub retry_queue: MemoryRetryQueue,
    pub user: FixedUser,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_parts(MemoryStorage::default(), ScriptedBackend::default())
    }

    pub fn with_storage(storage: MemoryStorage) -> Self {
        Self::with_parts(storage, ScriptedBackend::default())
    }

    pub fn with_backend(backend: ScriptedBackend) -> Self {
        Self::with_parts(MemoryStorage::default(), backend)
    }

    pub fn with_parts(storage: MemoryStorage, backend: ScriptedBackend) -> Self {
        let clock = MockClock::at_millis(T0_MILLIS);
        let scheduler = ManualScheduler::with_clock(clock.clone());
        let notifier = RecordingNotifier::default();
        let retry_queue = MemoryRetryQueue::default();
        let user = FixedUser::signed_in(USER_ID);

        let store = WorkoutStore::builder(Arc::new(storage.clone()), Arc::new(scheduler.clone()))
            .with_clock(Arc::new(clock.clone()))
            .with_notifier(Arc::new(notifier.clone()))
            .with_config(SessionConfig::default())
            .build();
        let coordinator = SaveCoordinator::new(
            store.clone(),
            Arc::new(backend.clone()),
            Arc::new(user.clone()),
            Arc::new(retry_queue.clone()),
        );

        Self { store, coordinator, clock, scheduler, storage, notifier, backend, retry_queue, user }
    }

    /// Run deferred tasks that are already due (the post-set hand-off).
    pub fn flush(&self) {
        self.scheduler.run_pending();
    }

    pub fn advance(&self, by: Duration) {
        self.scheduler.advance(by);
    }

    /// Grace period between a confirmed save and the reset.
    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.store.config().saved_reset_delay_ms)
    }
}

pub fn set(weight: f64, reps: u32, rest_time: u32) -> ExerciseSet {
    ExerciseSet::new(weight, reps, rest_time)
}

pub fn exercises(entries: Vec<(&str, Vec<ExerciseSet>)>) -> WorkoutExercises {
    entries.into_iter().collect()
}
