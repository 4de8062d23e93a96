//! Port interfaces for persisting a finished workout
//!
//! The backend must upsert by identity: the parent row by `workout_id`, sets
//! by `(workout_id, exercise_name, set_number)`. A retried save therefore
//! never duplicates rows that already landed.

use async_trait::async_trait;
use liftlog_domain::{Result, RetryEntry, SetRecord, WorkoutAnalytics, WorkoutRecord};

/// Durable storage for completed workouts
#[async_trait]
pub trait WorkoutBackend: Send + Sync {
    /// Create or update the parent workout row. Returns its id.
    async fn save_workout(&self, record: &WorkoutRecord) -> Result<String>;

    /// Write every set of one exercise.
    async fn save_exercise_sets(
        &self,
        workout_id: &str,
        exercise_name: &str,
        sets: &[SetRecord],
    ) -> Result<()>;

    /// Record derived bookkeeping (experience points, totals).
    async fn record_analytics(&self, analytics: &WorkoutAnalytics) -> Result<()>;

    /// Confirm that a previously partial workout is now complete.
    async fn recover_partially_completed_workout(&self, workout_id: &str) -> Result<()>;
}

/// Queue of partially saved workouts awaiting a follow-up
#[async_trait]
pub trait SaveRetryQueue: Send + Sync {
    async fn enqueue(&self, entry: RetryEntry) -> Result<()>;

    /// Entries still pending for `user_id`, oldest first.
    async fn pending_for_user(&self, user_id: &str) -> Result<Vec<RetryEntry>>;

    /// Remove and return every entry for `user_id`.
    async fn drain_for_user(&self, user_id: &str) -> Result<Vec<RetryEntry>>;

    /// Remove the entries of one workout once it is fully saved. Returns how
    /// many were removed.
    async fn discard_for_workout(&self, user_id: &str, workout_id: &str) -> Result<usize>;
}

/// Source of the signed-in user
pub trait UserContext: Send + Sync {
    fn current_user_id(&self) -> Option<String>;
}
