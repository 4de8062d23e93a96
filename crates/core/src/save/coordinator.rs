//! Save/recovery coordinator
//!
//! Drains the in-memory session into ordered backend writes:
//! `workout → exercise-sets → analytics`. Every path resolves to a
//! classified [`SaveOutcome`]; backend errors never escape.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use liftlog_common::time::millis_to_utc;
use liftlog_domain::{
    ExerciseSet, LiftlogError, Result, RetryEntry, SaveOutcome, SaveProgress, SaveStep,
    SessionState, SetRecord, TrainingConfig, WorkoutError, WorkoutRecord,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::analytics::build_analytics;
use super::ports::{SaveRetryQueue, UserContext, WorkoutBackend};
use crate::session::{NotificationKind, WorkoutStore};

/// Clears the in-flight flag when the save or recovery finishes.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).ok()?;
        Some(Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Persists finished workouts and resumes interrupted saves
pub struct SaveCoordinator {
    store: WorkoutStore,
    backend: Arc<dyn WorkoutBackend>,
    users: Arc<dyn UserContext>,
    retry_queue: Arc<dyn SaveRetryQueue>,
    in_flight: AtomicBool,
}

impl SaveCoordinator {
    pub fn new(
        store: WorkoutStore,
        backend: Arc<dyn WorkoutBackend>,
        users: Arc<dyn UserContext>,
        retry_queue: Arc<dyn SaveRetryQueue>,
    ) -> Self {
        Self { store, backend, users, retry_queue, in_flight: AtomicBool::new(false) }
    }

    /// True while a save or recovery is running.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Save the current session without progress reporting.
    pub async fn handle_complete_workout(
        &self,
        training_config: Option<TrainingConfig>,
    ) -> SaveOutcome {
        self.handle_complete_workout_with_progress(training_config, |_| {}).await
    }

    /// Save the current session, reporting progress after each unit of work.
    ///
    /// `training_config` overrides the one stored on the session. A call made
    /// while another save or recovery is running is rejected.
    pub async fn handle_complete_workout_with_progress<F>(
        &self,
        training_config: Option<TrainingConfig>,
        mut on_progress: F,
    ) -> SaveOutcome
    where
        F: FnMut(SaveProgress) + Send,
    {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return self.reject("A save is already in progress");
        };

        let state = self.store.state();
        if state.exercises.is_empty() {
            return self.reject("Add at least one exercise before finishing the workout");
        }
        let Some(user_id) = self.users.current_user_id() else {
            return self.reject("Sign in to save your workout");
        };

        let (writable, skipped) = partition_writable(&state);
        for name in &skipped {
            warn!(exercise = %name, "skipping exercise with no valid sets");
        }
        if writable.is_empty() {
            return self.reject("No valid sets to save");
        }

        let record = self.workout_record(&state, &user_id, training_config, &skipped);
        let duration_seconds = record.duration_seconds;
        self.store.mark_as_saving();

        // Step 1: parent workout row
        let workout_id = match self.backend.save_workout(&record).await {
            Ok(id) => {
                on_progress(progress(SaveStep::Workout, 1, 1, 0));
                id
            }
            Err(err) => {
                on_progress(progress(SaveStep::Workout, 1, 0, 1));
                error!(error = %err, "failed to save workout row");
                let error = WorkoutError::from_domain(&err, self.store.clock().now_utc());
                self.store.mark_as_failed(error.clone());
                return SaveOutcome::failed(error);
            }
        };
        info!(workout_id = %workout_id, exercises = writable.len(), "workout row saved");

        // Step 2: sets, one exercise at a time
        let total = writable.len();
        let mut failures: Vec<(String, LiftlogError)> = Vec::new();
        for (done, (name, sets)) in writable.iter().enumerate() {
            let records = set_records(name, sets);
            if let Err(err) = self.backend.save_exercise_sets(&workout_id, name, &records).await {
                warn!(exercise = %name, error = %err, "failed to save exercise sets");
                failures.push((name.clone(), err));
            }
            on_progress(progress(SaveStep::ExerciseSets, total, done + 1 - failures.len(), failures.len()));
        }

        if !failures.is_empty() {
            return self.partial_save(&workout_id, &user_id, total, failures).await;
        }

        // Step 3: analytics, best effort
        let analytics = build_analytics(&workout_id, &user_id, &state.exercises, duration_seconds);
        match self.backend.record_analytics(&analytics).await {
            Ok(()) => {
                debug!(xp = analytics.experience_points, "analytics recorded");
                on_progress(progress(SaveStep::Analytics, 1, 1, 0));
            }
            Err(err) => {
                warn!(error = %err, "failed to record analytics");
                on_progress(progress(SaveStep::Analytics, 1, 0, 1));
            }
        }

        // Entries from an earlier partial attempt of this workout are settled.
        match self.retry_queue.discard_for_workout(&user_id, &workout_id).await {
            Ok(0) => {}
            Ok(removed) => debug!(workout_id = %workout_id, removed, "stale retry entries cleared"),
            Err(err) => warn!(workout_id = %workout_id, error = %err, "failed to clear retry entries"),
        }

        self.store.mark_as_saved(workout_id.clone());
        SaveOutcome::saved(workout_id)
    }

    /// Resume a `partial` or `failed` save.
    ///
    /// Re-sends the sets of exercises queued for retry on this workout, then
    /// asks the backend to confirm. Success drains the user's retry queue and
    /// marks the session saved; failure appends an error and returns to
    /// `partial`.
    pub async fn attempt_recovery(&self, workout_id: &str, source: &str, meta: Value) -> SaveOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return self.reject("A save is already in progress");
        };
        let Some(user_id) = self.users.current_user_id() else {
            return self.reject("Sign in to recover your workout");
        };
        if let Err(err) = self.store.mark_as_recovering() {
            return self.reject(err.to_string());
        }
        info!(workout_id = %workout_id, source = %source, "attempting workout recovery");

        match self.recover(workout_id, &user_id).await {
            Ok(()) => {
                match self.retry_queue.drain_for_user(&user_id).await {
                    Ok(drained) => debug!(count = drained.len(), "retry queue drained"),
                    Err(err) => warn!(error = %err, "failed to drain retry queue"),
                }
                self.store.mark_as_saved(workout_id);
                self.store.notify(NotificationKind::Recovered, "Workout recovered");
                info!(workout_id = %workout_id, "workout recovered");
                SaveOutcome::saved(workout_id)
            }
            Err(err) => {
                error!(workout_id = %workout_id, error = %err, "workout recovery failed");
                let error = WorkoutError::from_domain(&err, self.store.clock().now_utc())
                    .with_details(json!({ "source": source, "meta": meta }));
                self.store.mark_as_partial_save(workout_id, vec![error.clone()]);
                SaveOutcome::partial(workout_id, error)
            }
        }
    }

    async fn recover(&self, workout_id: &str, user_id: &str) -> Result<()> {
        let pending = self.retry_queue.pending_for_user(user_id).await?;
        let exercises = self.store.read(|state| state.exercises.clone());

        for entry in pending.iter().filter(|entry| entry.workout_id == workout_id) {
            for name in &entry.failed_exercises {
                match exercises.get(name) {
                    Some(sets) if is_writable(sets) => {
                        self.backend
                            .save_exercise_sets(workout_id, name, &set_records(name, sets))
                            .await?;
                    }
                    _ => debug!(exercise = %name, "queued exercise no longer has sets to resend"),
                }
            }
        }

        self.backend.recover_partially_completed_workout(workout_id).await
    }

    async fn partial_save(
        &self,
        workout_id: &str,
        user_id: &str,
        total: usize,
        failures: Vec<(String, LiftlogError)>,
    ) -> SaveOutcome {
        let now = self.store.clock().now_utc();
        let names: Vec<String> = failures.iter().map(|(name, _)| name.clone()).collect();
        let messages: Vec<String> = failures.iter().map(|(_, err)| err.to_string()).collect();

        let mut error = failures
            .first()
            .map_or_else(
                || WorkoutError::validation("exercise sets failed", now),
                |(_, err)| WorkoutError::from_domain(err, now),
            )
            .with_details(json!({ "failedExercises": names, "errors": messages }));
        error.message =
            format!("Failed to save {} of {} exercises: {}", names.len(), total, names.join(", "));

        self.store.mark_as_partial_save(workout_id, vec![error.clone()]);

        let entry = RetryEntry {
            id: Uuid::now_v7().to_string(),
            workout_id: workout_id.to_string(),
            user_id: user_id.to_string(),
            failed_exercises: names,
            created_at: self.store.clock().now_millis(),
        };
        if let Err(err) = self.retry_queue.enqueue(entry).await {
            warn!(workout_id = %workout_id, error = %err, "failed to queue partial save for retry");
        }

        SaveOutcome::partial(workout_id, error)
    }

    fn workout_record(
        &self,
        state: &SessionState,
        user_id: &str,
        training_config: Option<TrainingConfig>,
        skipped: &[String],
    ) -> WorkoutRecord {
        let now = self.store.clock().now_millis();
        let duration_seconds = state.elapsed_time;
        let elapsed_millis = i64::try_from(duration_seconds.saturating_mul(1000)).unwrap_or(i64::MAX);
        let start = state.start_time.unwrap_or_else(|| now.saturating_sub(elapsed_millis));
        let config = training_config.or_else(|| state.training_config.clone());

        let name = config
            .as_ref()
            .filter(|config| !config.training_type.is_empty())
            .map_or_else(|| "Workout".to_string(), |config| format!("{} Workout", config.training_type));
        let metadata = json!({
            "sessionId": state.session_id,
            "trainingConfig": config,
            "exerciseCount": state.exercises.len(),
            "skippedExercises": skipped,
        });

        WorkoutRecord {
            workout_id: state.workout_id.clone(),
            user_id: user_id.to_string(),
            name,
            training_type: config.map(|config| config.training_type).unwrap_or_default(),
            start_time: millis_to_utc(start),
            end_time: millis_to_utc(now),
            duration_seconds,
            metadata,
        }
    }

    /// Refuse before any backend call. Never recorded in `savingErrors`.
    fn reject(&self, message: impl Into<String>) -> SaveOutcome {
        let error = WorkoutError::validation(message, self.store.clock().now_utc());
        warn!(reason = %error.message, "save rejected");
        self.store.notify(NotificationKind::Rejected, error.message.clone());
        SaveOutcome::failed(error)
    }
}

fn progress(step: SaveStep, total: usize, completed: usize, errors: usize) -> SaveProgress {
    SaveProgress { step, total, completed, errors }
}

fn is_writable(sets: &[ExerciseSet]) -> bool {
    !sets.is_empty() && sets.iter().all(ExerciseSet::is_well_formed)
}

/// Split exercises into those that can be written and the names of those
/// that cannot.
fn partition_writable(state: &SessionState) -> (Vec<(String, Vec<ExerciseSet>)>, Vec<String>) {
    let mut writable = Vec::new();
    let mut skipped = Vec::new();
    for (name, sets) in state.exercises.iter() {
        if is_writable(sets) {
            writable.push((name.to_string(), sets.to_vec()));
        } else {
            skipped.push(name.to_string());
        }
    }
    (writable, skipped)
}

fn set_records(exercise: &str, sets: &[ExerciseSet]) -> Vec<SetRecord> {
    sets.iter()
        .enumerate()
        .map(|(index, set)| SetRecord {
            exercise_name: exercise.to_string(),
            set_number: u32::try_from(index + 1).unwrap_or(u32::MAX),
            weight: set.weight,
            reps: set.reps,
            rest_time: set.rest_time,
            completed: set.completed,
            rpe: set.rpe,
        })
        .collect()
}
