//! In-memory implementations of the core ports
//!
//! Each mock records what it was asked to do and can be scripted to fail, so
//! tests can drive every branch of the session and save pipeline without a
//! database.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use liftlog_core::{KeyValueStorage, Notification, NotificationKind, Notifier};
use liftlog_core::{SaveRetryQueue, UserContext, WorkoutBackend};
use liftlog_domain::{
    LiftlogError, Result as DomainResult, RetryEntry, SetRecord, WorkoutAnalytics, WorkoutRecord,
};
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Key/value storage backed by a map.
#[derive(Default, Clone)]
pub struct MemoryStorage {
    values: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<Mutex<bool>>,
    writes: Arc<Mutex<usize>>,
}

impl MemoryStorage {
    pub fn with_value(key: &str, value: &str) -> Self {
        let storage = Self::default();
        storage.values.lock().insert(key.to_string(), value.to_string());
        storage
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        *self.writes.lock()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> DomainResult<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> DomainResult<()> {
        if *self.fail_writes.lock() {
            return Err(LiftlogError::Storage("disk full".into()));
        }
        self.values.lock().insert(key.to_string(), value.to_string());
        *self.writes.lock() += 1;
        Ok(())
    }
}

/// Notifier that keeps every notification.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.seen.lock().iter().map(|n| n.kind).collect()
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        self.seen.lock().iter().filter(|n| n.kind == kind).count()
    }

    pub fn last(&self) -> Option<Notification> {
        self.seen.lock().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().push(notification);
    }
}

#[derive(Default)]
struct BackendState {
    workouts: BTreeMap<String, WorkoutRecord>,
    /// Keyed by `(workout_id, exercise_name, set_number)`.
    sets: BTreeMap<(String, String, u32), SetRecord>,
    analytics: Vec<WorkoutAnalytics>,
    recovered: Vec<String>,
    next_id: u32,
    fail_workout: bool,
    failing_exercises: HashSet<String>,
    fail_analytics: bool,
    fail_recovery: bool,
    calls: Vec<String>,
}

/// Backend with upsert-by-identity semantics and scriptable failures.
#[derive(Default, Clone)]
pub struct ScriptedBackend {
    state: Arc<Mutex<BackendState>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedBackend {
    /// A backend whose `save_workout` waits until `gate` is notified.
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self { gate: Some(gate), ..Self::default() }
    }

    pub fn fail_workout(&self, fail: bool) {
        self.state.lock().fail_workout = fail;
    }

    pub fn fail_exercise(&self, exercise: &str) {
        self.state.lock().failing_exercises.insert(exercise.to_string());
    }

    pub fn heal_exercise(&self, exercise: &str) {
        self.state.lock().failing_exercises.remove(exercise);
    }

    pub fn fail_analytics(&self, fail: bool) {
        self.state.lock().fail_analytics = fail;
    }

    pub fn fail_recovery(&self, fail: bool) {
        self.state.lock().fail_recovery = fail;
    }

    pub fn workout_count(&self) -> usize {
        self.state.lock().workouts.len()
    }

    pub fn set_count(&self) -> usize {
        self.state.lock().sets.len()
    }

    pub fn sets_for(&self, exercise: &str) -> Vec<SetRecord> {
        self.state.lock().sets.values().filter(|s| s.exercise_name == exercise).cloned().collect()
    }

    pub fn analytics(&self) -> Vec<WorkoutAnalytics> {
        self.state.lock().analytics.clone()
    }

    pub fn recovered(&self) -> Vec<String> {
        self.state.lock().recovered.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }
}

#[async_trait]
impl WorkoutBackend for ScriptedBackend {
    async fn save_workout(&self, record: &WorkoutRecord) -> DomainResult<String> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let mut state = self.state.lock();
        state.calls.push("save_workout".into());
        if state.fail_workout {
            return Err(LiftlogError::Network("connection reset".into()));
        }
        let id = match &record.workout_id {
            Some(id) => id.clone(),
            None => {
                state.next_id += 1;
                format!("workout-{}", state.next_id)
            }
        };
        state.workouts.insert(id.clone(), record.clone());
        Ok(id)
    }

    async fn save_exercise_sets(
        &self,
        workout_id: &str,
        exercise_name: &str,
        sets: &[SetRecord],
    ) -> DomainResult<()> {
        let mut state = self.state.lock();
        state.calls.push(format!("save_exercise_sets:{exercise_name}"));
        if state.failing_exercises.contains(exercise_name) {
            return Err(LiftlogError::Database(format!("insert into sets failed for {exercise_name}")));
        }
        for set in sets {
            let key = (workout_id.to_string(), exercise_name.to_string(), set.set_number);
            state.sets.insert(key, set.clone());
        }
        Ok(())
    }

    async fn record_analytics(&self, analytics: &WorkoutAnalytics) -> DomainResult<()> {
        let mut state = self.state.lock();
        state.calls.push("record_analytics".into());
        if state.fail_analytics {
            return Err(LiftlogError::Network("analytics unavailable".into()));
        }
        state.analytics.push(analytics.clone());
        Ok(())
    }

    async fn recover_partially_completed_workout(&self, workout_id: &str) -> DomainResult<()> {
        let mut state = self.state.lock();
        state.calls.push("recover".into());
        if state.fail_recovery {
            return Err(LiftlogError::Network("still offline".into()));
        }
        if !state.workouts.contains_key(workout_id) {
            return Err(LiftlogError::NotFound(format!("workout {workout_id}")));
        }
        state.recovered.push(workout_id.to_string());
        Ok(())
    }
}

/// Retry queue backed by a vector.
#[derive(Default, Clone)]
pub struct MemoryRetryQueue {
    entries: Arc<Mutex<Vec<RetryEntry>>>,
}

impl MemoryRetryQueue {
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

#[async_trait]
impl SaveRetryQueue for MemoryRetryQueue {
    async fn enqueue(&self, entry: RetryEntry) -> DomainResult<()> {
        self.entries.lock().push(entry);
        Ok(())
    }

    async fn pending_for_user(&self, user_id: &str) -> DomainResult<Vec<RetryEntry>> {
        Ok(self.entries.lock().iter().filter(|e| e.user_id == user_id).cloned().collect())
    }

    async fn drain_for_user(&self, user_id: &str) -> DomainResult<Vec<RetryEntry>> {
        let mut entries = self.entries.lock();
        let (drained, kept): (Vec<RetryEntry>, Vec<RetryEntry>) =
            entries.drain(..).partition(|e| e.user_id == user_id);
        *entries = kept;
        Ok(drained)
    }

    async fn discard_for_workout(&self, user_id: &str, workout_id: &str) -> DomainResult<usize> {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|e| !(e.user_id == user_id && e.workout_id == workout_id));
        Ok(before - entries.len())
    }
}

/// User context with a fixed, switchable user.
#[derive(Default, Clone)]
pub struct FixedUser {
    user_id: Arc<Mutex<Option<String>>>,
}

impl FixedUser {
    pub fn signed_in(user_id: &str) -> Self {
        let user = Self::default();
        user.set(Some(user_id));
        user
    }

    pub fn set(&self, user_id: Option<&str>) {
        *self.user_id.lock() = user_id.map(str::to_string);
    }
}

impl UserContext for FixedUser {
    fn current_user_id(&self) -> Option<String> {
        self.user_id.lock().clone()
    }
}
