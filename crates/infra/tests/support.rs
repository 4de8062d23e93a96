#![allow(dead_code)]

use std::sync::Arc;

use liftlog_common::testing::{ManualScheduler, MockClock};
use liftlog_core::{SaveCoordinator, WorkoutStore};
use liftlog_domain::{ExerciseSet, WorkoutExercises};
use liftlog_infra::database::{DbManager, SqliteRetryQueue, SqliteWorkoutBackend};
use liftlog_infra::{FileKeyValueStorage, StaticUserContext, TracingNotifier};
use tempfile::TempDir;

pub const USER_ID: &str = "user-1";

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a new temporary database with migrations applied.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("test.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("migrations should apply");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }

    pub fn count(&self, sql: &str) -> i64 {
        let conn = self.manager.get_connection().expect("connection should be available");
        conn.query_row(sql, [], |row| row.get(0)).expect("count query should succeed")
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Session engine wired to real SQLite and file adapters, with virtual time.
pub struct SqliteHarness {
    pub db: TestDatabase,
    pub store: WorkoutStore,
    pub coordinator: SaveCoordinator,
    pub backend: Arc<SqliteWorkoutBackend>,
    pub retry_queue: Arc<SqliteRetryQueue>,
    pub scheduler: ManualScheduler,
    pub storage_dir: TempDir,
}

impl SqliteHarness {
    pub fn new() -> Self {
        let db = TestDatabase::new();
        let storage_dir = TempDir::new().expect("temp dir should be created");
        let storage = FileKeyValueStorage::new(storage_dir.path()).expect("storage should open");
        let clock = MockClock::at_millis(1_700_000_000_000);
        let scheduler = ManualScheduler::with_clock(clock.clone());

        let store = WorkoutStore::builder(Arc::new(storage), Arc::new(scheduler.clone()))
            .with_clock(Arc::new(clock))
            .with_notifier(Arc::new(TracingNotifier))
            .build();
        let backend = Arc::new(SqliteWorkoutBackend::new(Arc::clone(&db.manager)));
        let retry_queue = Arc::new(SqliteRetryQueue::new(Arc::clone(&db.manager)));
        let coordinator = SaveCoordinator::new(
            store.clone(),
            backend.clone(),
            Arc::new(StaticUserContext::new(Some(USER_ID.to_string()))),
            retry_queue.clone(),
        );

        Self { db, store, coordinator, backend, retry_queue, scheduler, storage_dir }
    }
}

pub fn exercises(entries: Vec<(&str, Vec<ExerciseSet>)>) -> WorkoutExercises {
    entries.into_iter().collect()
}
