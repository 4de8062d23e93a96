//! Versioned snapshot of the persisted slice of session state
//!
//! Only the fields listed on [`SessionSnapshot`] survive a reload; everything
//! else (post-set flow, rest timer, saving errors) starts fresh.

use liftlog_domain::constants::SNAPSHOT_VERSION;
use liftlog_domain::{
    new_session_id, SessionState, TrainingConfig, WorkoutExercises, WorkoutStatus,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Why a stored snapshot could not be used.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("snapshot version {0} is newer than this build supports")]
    UnsupportedVersion(u64),
}

/// Persisted form of [`SessionState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub version: u32,
    pub exercises: WorkoutExercises,
    pub active_exercise: Option<String>,
    pub elapsed_time: u64,
    pub workout_id: Option<String>,
    pub start_time: Option<i64>,
    pub workout_status: WorkoutStatus,
    pub training_config: Option<TrainingConfig>,
    pub is_active: bool,
    pub last_active_route: Option<String>,
    // Added in version 2
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub explicitly_ended: bool,
    #[serde(default)]
    pub focused_exercise: Option<String>,
    #[serde(default)]
    pub focused_set_index: Option<usize>,
}

impl SessionSnapshot {
    pub fn from_state(state: &SessionState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            exercises: state.exercises.clone(),
            active_exercise: state.active_exercise.clone(),
            elapsed_time: state.elapsed_time,
            workout_id: state.workout_id.clone(),
            start_time: state.start_time,
            workout_status: state.workout_status,
            training_config: state.training_config.clone(),
            is_active: state.is_active,
            last_active_route: state.last_active_route.clone(),
            session_id: Some(state.session_id.clone()),
            explicitly_ended: state.explicitly_ended,
            focused_exercise: state.focused_exercise.clone(),
            focused_set_index: state.focused_set_index,
        }
    }

    /// Rebuild a session from this snapshot.
    ///
    /// Transient statuses cannot resume after a reload: an interrupted save
    /// becomes `partial` when the parent row was written and `failed`
    /// otherwise, and an interrupted recovery becomes `partial`. Dangling
    /// focus pointers are dropped.
    pub fn into_state(self, now_millis: i64) -> SessionState {
        let mut state =
            SessionState::new(self.session_id.unwrap_or_else(new_session_id), now_millis);

        state.workout_status = match self.workout_status {
            WorkoutStatus::Saving if self.workout_id.is_some() => WorkoutStatus::Partial,
            WorkoutStatus::Saving => WorkoutStatus::Failed,
            WorkoutStatus::Recovering => WorkoutStatus::Partial,
            other => other,
        };
        state.exercises = self.exercises;
        state.active_exercise = self.active_exercise;
        state.elapsed_time = self.elapsed_time;
        state.workout_id = self.workout_id;
        state.start_time = self.start_time;
        state.training_config = self.training_config;
        state.is_active = self.is_active;
        state.last_active_route = self.last_active_route;
        state.explicitly_ended = self.explicitly_ended;

        if let Some(exercise) = self.focused_exercise {
            let index_valid = self
                .focused_set_index
                .map_or(true, |index| state.exercises.set(&exercise, index).is_some());
            if state.exercises.contains(&exercise) && index_valid {
                state.focused_exercise = Some(exercise);
                state.focused_set_index = self.focused_set_index;
            }
        }
        state
    }

    pub fn encode(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a stored snapshot, upgrading older versions.
    ///
    /// A missing `version` field is read as version 1.
    pub fn decode(raw: &str) -> Result<Self, SnapshotError> {
        let mut value: Value = serde_json::from_str(raw)?;
        let version = value.get("version").and_then(Value::as_u64).unwrap_or(1);
        if version > u64::from(SNAPSHOT_VERSION) {
            return Err(SnapshotError::UnsupportedVersion(version));
        }
        if let Some(object) = value.as_object_mut() {
            object.insert("version".to_string(), Value::from(SNAPSHOT_VERSION));
        }
        Ok(serde_json::from_value(value)?)
    }
}
