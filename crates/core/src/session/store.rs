//! Workout session state machine
//!
//! [`WorkoutStore`] owns the single [`SessionState`] of the active workout.
//! Every action is a read-modify-write under one lock, followed by a
//! snapshot write to [`KeyValueStorage`]. Deferred work (the post-set
//! hand-off, the post-save reset) goes through a [`TaskScheduler`] and is
//! cancelled on reset so it never fires against a newer session.

use std::sync::{Arc, Weak};
use std::time::Duration;

use liftlog_common::time::{Clock, SystemClock, TaskScheduler, TimerHandle};
use liftlog_domain::constants::DEFAULT_SET_REPS;
use liftlog_domain::{
    new_session_id, ExerciseSet, LiftlogError, Result, SessionConfig, SessionState, SetUpdate,
    TrainingConfig, WorkoutError, WorkoutExercises, WorkoutStatus,
};
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use super::persistence::SessionSnapshot;
use super::ports::{KeyValueStorage, Notification, NotificationKind, Notifier, SilentNotifier};
use crate::recommendation::{RecommendationEngine, RpeRecommendationEngine};

pub(crate) struct StoreInner {
    pub(crate) state: Mutex<SessionState>,
    storage: Arc<dyn KeyValueStorage>,
    pub(crate) clock: Arc<dyn Clock>,
    scheduler: Arc<dyn TaskScheduler>,
    notifier: Arc<dyn Notifier>,
    pub(crate) engine: Arc<dyn RecommendationEngine>,
    config: SessionConfig,
    timers: Mutex<Vec<TimerHandle>>,
    /// Last snapshot accepted by storage. Only touched under the state lock.
    last_snapshot: Mutex<Option<String>>,
}

/// Builder for [`WorkoutStore`]
pub struct WorkoutStoreBuilder {
    storage: Arc<dyn KeyValueStorage>,
    scheduler: Arc<dyn TaskScheduler>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    engine: Arc<dyn RecommendationEngine>,
    config: SessionConfig,
}

impl WorkoutStoreBuilder {
    pub fn new(storage: Arc<dyn KeyValueStorage>, scheduler: Arc<dyn TaskScheduler>) -> Self {
        Self {
            storage,
            scheduler,
            clock: Arc::new(SystemClock),
            notifier: Arc::new(SilentNotifier),
            engine: Arc::new(RpeRecommendationEngine),
            config: SessionConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_recommendation_engine(mut self, engine: Arc<dyn RecommendationEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Build an idle store. Call [`WorkoutStore::rehydrate`] to restore a
    /// stored session.
    pub fn build(self) -> WorkoutStore {
        let state = SessionState::new(new_session_id(), self.clock.now_millis());
        WorkoutStore {
            inner: Arc::new(StoreInner {
                state: Mutex::new(state),
                storage: self.storage,
                clock: self.clock,
                scheduler: self.scheduler,
                notifier: self.notifier,
                engine: self.engine,
                config: self.config,
                timers: Mutex::new(Vec::new()),
                last_snapshot: Mutex::new(None),
            }),
        }
    }
}

/// Shared handle to the session state container. Clones share state.
#[derive(Clone)]
pub struct WorkoutStore {
    pub(crate) inner: Arc<StoreInner>,
}

impl WorkoutStore {
    pub fn builder(
        storage: Arc<dyn KeyValueStorage>,
        scheduler: Arc<dyn TaskScheduler>,
    ) -> WorkoutStoreBuilder {
        WorkoutStoreBuilder::new(storage, scheduler)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Copy of the current state.
    pub fn state(&self) -> SessionState {
        self.inner.state.lock().clone()
    }

    /// Run `f` against the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.inner.state.lock())
    }

    pub fn status(&self) -> WorkoutStatus {
        self.read(|state| state.workout_status)
    }

    pub fn session_id(&self) -> String {
        self.read(|state| state.session_id.clone())
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.inner.clock.clone()
    }

    /// Deferred tasks that have neither run nor been cancelled.
    pub fn pending_tasks(&self) -> usize {
        let mut timers = self.inner.timers.lock();
        timers.retain(|timer| !timer.is_done());
        timers.len()
    }

    // ------------------------------------------------------------------
    // Rehydration
    // ------------------------------------------------------------------

    /// Restore the stored session, if any.
    ///
    /// Missing, corrupt or unsupported snapshots leave the store idle. For an
    /// active session with a wall-clock anchor, elapsed time is recomputed
    /// and applied only when it grows. Returns whether an active session was
    /// recovered.
    pub fn rehydrate(&self) -> bool {
        let key = &self.inner.config.snapshot_key;
        let raw = match self.inner.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %key, "no stored session snapshot");
                return false;
            }
            Err(err) => {
                warn!(key = %key, error = %err, "failed to read session snapshot");
                return false;
            }
        };
        let snapshot = match SessionSnapshot::decode(&raw) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(key = %key, error = %err, "discarding unusable session snapshot");
                return false;
            }
        };

        let now = self.inner.clock.now_millis();
        let recovered = self.update("rehydrate", |state| {
            let mut restored = snapshot.into_state(now);
            if restored.workout_status == WorkoutStatus::Saved {
                // The save was confirmed; only the grace-period reset was lost.
                *state = SessionState::new(new_session_id(), now);
                return None;
            }
            if restored.is_active {
                if let Some(start) = restored.start_time {
                    let wall_clock = super::reconciler::elapsed_since(start, now);
                    if wall_clock > restored.elapsed_time {
                        restored.elapsed_time = wall_clock;
                    }
                }
            }
            let recovered = restored.is_active.then(|| restored.elapsed_time);
            *state = restored;
            recovered
        });

        match recovered {
            Some(elapsed) => {
                info!(elapsed_secs = elapsed, "workout session recovered");
                self.notify(NotificationKind::SessionRecovered, "Workout session recovered");
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Begin a workout. Allowed only from `idle`; exercises already present
    /// (for example restored after a reload) are kept.
    pub fn start_workout(&self) -> Result<()> {
        let now = self.inner.clock.now_millis();
        let started = self.update("start_workout", |state| {
            if state.workout_status != WorkoutStatus::Idle {
                return Err(LiftlogError::InvalidInput(format!(
                    "cannot start a workout while {}",
                    state.workout_status
                )));
            }
            state.start_time = Some(now);
            state.elapsed_time = 0;
            state.session_id = new_session_id();
            state.is_active = true;
            state.explicitly_ended = false;
            state.workout_status = WorkoutStatus::Active;
            state.workout_id = None;
            state.saving_errors.clear();
            state.last_tab_activity = now;
            Ok(state.session_id.clone())
        })?;

        info!(session_id = %started, "workout started");
        self.notify(NotificationKind::Started, "Workout started");
        Ok(())
    }

    /// Stop the session without discarding exercise data.
    pub fn end_workout(&self) {
        self.update("end_workout", |state| {
            state.is_active = false;
            state.explicitly_ended = true;
            state.workout_status = WorkoutStatus::Idle;
            state.clear_post_set_flow();
        });
        info!("workout ended");
    }

    /// Hard wipe: cancels deferred work and starts a fresh idle session.
    pub fn reset_session(&self) {
        let cancelled = {
            let mut timers = self.inner.timers.lock();
            let count = timers.iter().filter(|timer| !timer.is_done()).count();
            timers.drain(..).for_each(|timer| timer.cancel());
            count
        };
        let now = self.inner.clock.now_millis();
        let session_id = self.update("reset_session", |state| {
            *state = SessionState::new(new_session_id(), now);
            state.session_id.clone()
        });
        info!(session_id = %session_id, cancelled_tasks = cancelled, "session reset");
    }

    /// Start a save attempt. Errors from earlier attempts are dropped; the
    /// list only describes the attempt in progress.
    pub fn mark_as_saving(&self) {
        self.update("mark_as_saving", |state| {
            state.workout_status = WorkoutStatus::Saving;
            state.saving_errors.clear();
        });
        info!("workout saving");
        self.notify(NotificationKind::Saving, "Saving workout...");
    }

    /// Record a confirmed save and schedule the reset after the grace delay.
    ///
    /// The reset only runs if the session is still `saved` when it fires.
    pub fn mark_as_saved(&self, workout_id: impl Into<String>) {
        let workout_id = workout_id.into();
        self.update("mark_as_saved", |state| {
            state.workout_status = WorkoutStatus::Saved;
            state.workout_id = Some(workout_id.clone());
            state.is_active = false;
        });
        info!(workout_id = %workout_id, "workout saved");
        self.notify(NotificationKind::Saved, "Workout saved");

        let delay = Duration::from_millis(self.inner.config.saved_reset_delay_ms);
        self.schedule(delay, |store| {
            if store.status() == WorkoutStatus::Saved {
                store.reset_session();
            } else {
                debug!("skipping post-save reset; session moved on");
            }
        });
    }

    /// Record a failure before anything was persisted. Data is retained.
    pub fn mark_as_failed(&self, error: WorkoutError) {
        let message = error.message.clone();
        self.update("mark_as_failed", |state| {
            state.workout_status = WorkoutStatus::Failed;
            state.saving_errors.push(error);
        });
        warn!(error = %message, "workout save failed");
        self.notify(NotificationKind::Failed, format!("Failed to save workout: {message}"));
    }

    /// Record a partial save. Data and the parent id are retained for retry.
    pub fn mark_as_partial_save(&self, workout_id: impl Into<String>, errors: Vec<WorkoutError>) {
        let workout_id = workout_id.into();
        let summary = errors
            .iter()
            .map(|error| error.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        let error_count = errors.len();
        self.update("mark_as_partial_save", |state| {
            state.workout_status = WorkoutStatus::Partial;
            state.workout_id = Some(workout_id.clone());
            state.saving_errors.extend(errors);
        });
        warn!(workout_id = %workout_id, errors = error_count, "workout partially saved");
        self.notify(NotificationKind::Partial, format!("Workout partially saved: {summary}"));
    }

    /// Enter `recovering`. Only `failed` and `partial` sessions can recover.
    pub fn mark_as_recovering(&self) -> Result<()> {
        self.update("mark_as_recovering", |state| {
            if !state.workout_status.is_recoverable() {
                return Err(LiftlogError::InvalidInput(format!(
                    "nothing to recover while {}",
                    state.workout_status
                )));
            }
            state.workout_status = WorkoutStatus::Recovering;
            Ok(())
        })?;
        info!("workout recovery started");
        self.notify(NotificationKind::Recovering, "Recovering workout...");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Exercise editing
    // ------------------------------------------------------------------

    /// Replace every exercise. Pointers into exercises that no longer exist
    /// are cleared.
    pub fn set_exercises(&self, exercises: WorkoutExercises) {
        self.update("set_exercises", |state| {
            state.exercises = exercises;
            let focus_valid = match (&state.focused_exercise, state.focused_set_index) {
                (Some(name), Some(index)) => state.exercises.set(name, index).is_some(),
                (Some(name), None) => state.exercises.contains(name),
                (None, _) => true,
            };
            if !focus_valid {
                state.clear_focus();
            }
            if state.active_exercise.as_deref().is_some_and(|name| !state.exercises.contains(name))
            {
                state.active_exercise = None;
            }
            if state.last_completed_exercise.is_some() && state.last_completed_set().is_none() {
                state.clear_post_set_flow();
            }
        });
    }

    /// Append a new exercise. Returns false when the name is already taken.
    pub fn add_exercise(&self, name: impl Into<String>, sets: Vec<ExerciseSet>) -> bool {
        let name = name.into();
        let added = self.update("add_exercise", |state| {
            if state.exercises.contains(&name) {
                return false;
            }
            state.exercises.insert(name.clone(), sets);
            true
        });
        if !added {
            debug!(exercise = %name, "exercise already present");
        }
        added
    }

    /// Append a set copying the previous set's targets. Returns its index.
    pub fn add_set(&self, exercise: &str) -> Option<usize> {
        let default_rest = self.inner.config.default_rest_seconds;
        self.update("add_set", |state| {
            let sets = state.exercises.get_mut(exercise)?;
            let next = sets
                .last()
                .map_or_else(|| ExerciseSet::new(0.0, DEFAULT_SET_REPS, default_rest), ExerciseSet::next_from);
            sets.push(next);
            Some(sets.len() - 1)
        })
    }

    /// Edit a set's targets. Returns whether the set exists.
    pub fn update_set(&self, exercise: &str, set_index: usize, update: SetUpdate) -> Result<bool> {
        if update.weight.is_some_and(|weight| !weight.is_finite() || weight < 0.0) {
            return Err(LiftlogError::InvalidInput(format!(
                "weight must be a non-negative number, got {:?}",
                update.weight
            )));
        }
        Ok(self.update("update_set", |state| {
            match state.exercises.set_mut(exercise, set_index) {
                Some(set) => {
                    update.apply_to(set);
                    true
                }
                None => false,
            }
        }))
    }

    /// Remove one set. Focus and post-set pointers into later sets shift
    /// down; pointers to the removed set are cleared.
    pub fn remove_set(&self, exercise: &str, set_index: usize) -> bool {
        self.update("remove_set", |state| {
            let Some(sets) = state.exercises.get_mut(exercise) else {
                return false;
            };
            if set_index >= sets.len() {
                return false;
            }
            sets.remove(set_index);

            if state.focused_exercise.as_deref() == Some(exercise) {
                match state.focused_set_index {
                    Some(index) if index == set_index => state.clear_focus(),
                    Some(index) if index > set_index => state.focused_set_index = Some(index - 1),
                    _ => {}
                }
            }
            if state.last_completed_exercise.as_deref() == Some(exercise) {
                match state.last_completed_set_index {
                    Some(index) if index == set_index => state.clear_post_set_flow(),
                    Some(index) if index > set_index => {
                        state.last_completed_set_index = Some(index - 1);
                    }
                    _ => {}
                }
            }
            true
        })
    }

    /// Remove an exercise. Removing the last one prompts to end the workout.
    pub fn delete_exercise(&self, exercise: &str) -> bool {
        let outcome = self.update("delete_exercise", |state| {
            state.exercises.remove(exercise)?;
            state.forget_exercise(exercise);
            Some(state.exercises.is_empty())
        });

        match outcome {
            Some(now_empty) => {
                debug!(exercise = %exercise, "exercise deleted");
                if now_empty {
                    self.notify(
                        NotificationKind::EndWorkoutPrompt,
                        "No exercises left. End this workout?",
                    );
                }
                true
            }
            None => false,
        }
    }

    pub fn set_active_exercise(&self, exercise: Option<String>) {
        self.update("set_active_exercise", |state| state.active_exercise = exercise);
    }

    /// Point focus at a set. Returns false when the set does not exist.
    pub fn set_focus(&self, exercise: &str, set_index: Option<usize>) -> bool {
        self.update("set_focus", |state| {
            let exists = match set_index {
                Some(index) => state.exercises.set(exercise, index).is_some(),
                None => state.exercises.contains(exercise),
            };
            if exists {
                state.focused_exercise = Some(exercise.to_string());
                state.focused_set_index = set_index;
            }
            exists
        })
    }

    pub fn clear_focus(&self) {
        self.update("clear_focus", SessionState::clear_focus);
    }

    pub fn set_training_config(&self, config: Option<TrainingConfig>) {
        self.update("set_training_config", |state| state.training_config = config);
    }

    pub fn set_last_active_route(&self, route: Option<String>) {
        self.update("set_last_active_route", |state| state.last_active_route = route);
    }

    pub fn touch_tab_activity(&self) {
        let now = self.inner.clock.now_millis();
        self.update("touch_tab_activity", |state| state.last_tab_activity = now);
    }

    /// One-second tick of the session timer.
    pub fn tick(&self) {
        self.update("tick", |state| {
            if state.is_active {
                state.elapsed_time = state.elapsed_time.saturating_add(1);
            }
        });
    }

    // ------------------------------------------------------------------
    // Set completion
    // ------------------------------------------------------------------

    /// Mark a set completed and defer the post-set flow by one tick.
    ///
    /// Missing sets and sets that are already completed are no-ops, so
    /// repeated calls never trigger a second flow.
    pub fn handle_complete_set(&self, exercise: &str, set_index: usize) {
        let completed = self.update("handle_complete_set", |state| {
            let Some(set) = state.exercises.set_mut(exercise, set_index) else {
                return false;
            };
            if set.completed {
                return false;
            }
            set.completed = true;
            state.last_completed_exercise = Some(exercise.to_string());
            state.last_completed_set_index = Some(set_index);
            true
        });

        if completed {
            debug!(exercise = %exercise, set_index, "set completed");
            self.schedule(Duration::ZERO, WorkoutStore::start_post_set_flow);
        } else {
            debug!(exercise = %exercise, set_index, "ignoring completion of missing or completed set");
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Apply one action and write the resulting snapshot.
    ///
    /// The snapshot is written under the state lock so writes land in
    /// mutation order. A snapshot identical to the last one written is
    /// skipped.
    pub(crate) fn update<R>(&self, action: &'static str, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.inner.state.lock();
        let result = f(&mut state);
        self.persist(action, &state);
        result
    }

    fn persist(&self, action: &'static str, state: &SessionState) {
        let key = &self.inner.config.snapshot_key;
        let encoded = match SessionSnapshot::from_state(state).encode() {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(action, error = %err, "failed to encode session snapshot");
                return;
            }
        };
        let mut last = self.inner.last_snapshot.lock();
        if last.as_deref() == Some(encoded.as_str()) {
            return;
        }
        match self.inner.storage.set(key, &encoded) {
            Ok(()) => {
                trace!(action, key = %key, "session snapshot written");
                *last = Some(encoded);
            }
            Err(err) => warn!(action, key = %key, error = %err, "failed to write session snapshot"),
        }
    }

    pub(crate) fn notify(&self, kind: NotificationKind, message: impl Into<String>) {
        self.inner.notifier.notify(Notification::new(kind, message));
    }

    /// Schedule `task` against this store. The task holds a weak reference
    /// and is dropped silently if the store is gone.
    pub(crate) fn schedule(
        &self,
        delay: Duration,
        task: impl FnOnce(&WorkoutStore) + Send + 'static,
    ) {
        let weak: Weak<StoreInner> = Arc::downgrade(&self.inner);
        let handle = self.inner.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    task(&WorkoutStore { inner });
                }
            }),
        );
        let mut timers = self.inner.timers.lock();
        timers.retain(|timer| !timer.is_done());
        timers.push(handle);
    }
}
