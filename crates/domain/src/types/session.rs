//! Session state of the active workout

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::save::WorkoutError;
use super::workout::{ExerciseSet, TrainingConfig, WorkoutExercises};
use crate::impl_status_conversions;

/// Lifecycle status of the workout.
///
/// `idle → active → saving → {saved | failed | partial}`; `recovering` is
/// entered from `failed`/`partial` and leaves to `saved` or `partial`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutStatus {
    #[default]
    Idle,
    Active,
    Saving,
    Saved,
    Failed,
    Partial,
    Recovering,
}

impl_status_conversions!(WorkoutStatus {
    Idle => "idle",
    Active => "active",
    Saving => "saving",
    Saved => "saved",
    Failed => "failed",
    Partial => "partial",
    Recovering => "recovering",
});

impl WorkoutStatus {
    /// Statuses from which a manual recovery may be attempted.
    pub fn is_recoverable(self) -> bool {
        matches!(self, Self::Failed | Self::Partial)
    }
}

/// Post-set feedback sub-state: `idle → rating → resting → idle`.
///
/// `Preparing` is a reserved transitional state; nothing enters it today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostSetFlow {
    #[default]
    Idle,
    Rating,
    Resting,
    Preparing,
}

impl_status_conversions!(PostSetFlow {
    Idle => "idle",
    Rating => "rating",
    Resting => "resting",
    Preparing => "preparing",
});

/// Generate an opaque session identifier.
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// In-memory state of the active workout session.
///
/// Timestamps are milliseconds since the UNIX epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub exercises: WorkoutExercises,
    pub active_exercise: Option<String>,
    pub focused_exercise: Option<String>,
    pub focused_set_index: Option<usize>,
    pub elapsed_time: u64,
    pub start_time: Option<i64>,
    pub workout_id: Option<String>,
    pub workout_status: WorkoutStatus,
    pub is_active: bool,
    pub last_active_route: Option<String>,
    pub post_set_flow: PostSetFlow,
    pub last_completed_exercise: Option<String>,
    pub last_completed_set_index: Option<usize>,
    pub rest_timer_active: bool,
    pub current_rest_time: u32,
    pub rest_elapsed: u32,
    pub training_config: Option<TrainingConfig>,
    pub session_id: String,
    pub explicitly_ended: bool,
    pub last_tab_activity: i64,
    pub saving_errors: Vec<WorkoutError>,
}

impl SessionState {
    /// Default (idle) state with the given identity.
    pub fn new(session_id: impl Into<String>, now_millis: i64) -> Self {
        Self {
            exercises: WorkoutExercises::new(),
            active_exercise: None,
            focused_exercise: None,
            focused_set_index: None,
            elapsed_time: 0,
            start_time: None,
            workout_id: None,
            workout_status: WorkoutStatus::Idle,
            is_active: false,
            last_active_route: None,
            post_set_flow: PostSetFlow::Idle,
            last_completed_exercise: None,
            last_completed_set_index: None,
            rest_timer_active: false,
            current_rest_time: 0,
            rest_elapsed: 0,
            training_config: None,
            session_id: session_id.into(),
            explicitly_ended: false,
            last_tab_activity: now_millis,
            saving_errors: Vec::new(),
        }
    }

    /// The set the post-set flow currently points at, if the pointer is valid.
    pub fn last_completed_set(&self) -> Option<&ExerciseSet> {
        let exercise = self.last_completed_exercise.as_deref()?;
        let index = self.last_completed_set_index?;
        self.exercises.set(exercise, index)
    }

    pub fn clear_focus(&mut self) {
        self.focused_exercise = None;
        self.focused_set_index = None;
    }

    pub fn clear_post_set_flow(&mut self) {
        self.post_set_flow = PostSetFlow::Idle;
        self.last_completed_exercise = None;
        self.last_completed_set_index = None;
        self.rest_timer_active = false;
        self.rest_elapsed = 0;
    }

    /// Drop every pointer that references `exercise`.
    pub fn forget_exercise(&mut self, exercise: &str) {
        if self.focused_exercise.as_deref() == Some(exercise) {
            self.clear_focus();
        }
        if self.active_exercise.as_deref() == Some(exercise) {
            self.active_exercise = None;
        }
        if self.last_completed_exercise.as_deref() == Some(exercise) {
            self.clear_post_set_flow();
        }
    }

    /// Seconds left on the rest timer; zero when it is not running.
    pub fn rest_remaining(&self) -> u32 {
        if self.rest_timer_active {
            self.current_rest_time.saturating_sub(self.rest_elapsed)
        } else {
            0
        }
    }
}
