//! Save pipeline types: errors, progress, outcome and backend records

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::LiftlogError;
use crate::impl_status_conversions;

/// Classification of a save failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutErrorType {
    Network,
    Database,
    Validation,
    Unknown,
}

impl_status_conversions!(WorkoutErrorType {
    Network => "network",
    Database => "database",
    Validation => "validation",
    Unknown => "unknown",
});

/// A classified save failure. Appended to the session, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutError {
    #[serde(rename = "type")]
    pub error_type: WorkoutErrorType,
    pub message: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
    pub recoverable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl WorkoutError {
    /// Build an error; network/database/unknown failures are recoverable by
    /// default, validation failures are not.
    pub fn new(
        error_type: WorkoutErrorType,
        message: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            error_type,
            message: message.into(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            recoverable: error_type != WorkoutErrorType::Validation,
            details: None,
        }
    }

    pub fn validation(message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::new(WorkoutErrorType::Validation, message, at)
    }

    /// Classify a domain error.
    pub fn from_domain(err: &LiftlogError, at: DateTime<Utc>) -> Self {
        let error_type = match err {
            LiftlogError::Network(_) => WorkoutErrorType::Network,
            LiftlogError::Database(_) | LiftlogError::Storage(_) | LiftlogError::NotFound(_) => {
                WorkoutErrorType::Database
            }
            LiftlogError::InvalidInput(_) => WorkoutErrorType::Validation,
            _ => WorkoutErrorType::Unknown,
        };
        Self::new(error_type, err.to_string(), at)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Ordered steps of the save pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SaveStep {
    Workout,
    ExerciseSets,
    Analytics,
}

impl_status_conversions!(SaveStep {
    Workout => "workout",
    ExerciseSets => "exercise-sets",
    Analytics => "analytics",
});

/// Progress report emitted after each unit of work in a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveProgress {
    pub step: SaveStep,
    pub total: usize,
    pub completed: usize,
    pub errors: usize,
}

/// Fully classified result of a save or recovery attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub success: bool,
    pub partial_save: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workout_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<WorkoutError>,
}

impl SaveOutcome {
    pub fn saved(workout_id: impl Into<String>) -> Self {
        Self { success: true, partial_save: false, workout_id: Some(workout_id.into()), error: None }
    }

    pub fn partial(workout_id: impl Into<String>, error: WorkoutError) -> Self {
        Self {
            success: false,
            partial_save: true,
            workout_id: Some(workout_id.into()),
            error: Some(error),
        }
    }

    pub fn failed(error: WorkoutError) -> Self {
        Self { success: false, partial_save: false, workout_id: None, error: Some(error) }
    }
}

/// Parent workout row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    /// Existing id when retrying, so the backend upserts instead of inserting.
    pub workout_id: Option<String>,
    pub user_id: String,
    pub name: String,
    pub training_type: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: u64,
    pub metadata: Value,
}

/// One persisted set, identified by `(workout_id, exercise_name, set_number)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    pub exercise_name: String,
    /// 1-based position within the exercise
    pub set_number: u32,
    pub weight: f64,
    pub reps: u32,
    pub rest_time: u32,
    pub completed: bool,
    pub rpe: Option<u8>,
}

/// Aggregate bookkeeping written by the analytics step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutAnalytics {
    pub workout_id: String,
    pub user_id: String,
    pub experience_points: u64,
    pub total_volume: f64,
    pub completed_sets: u32,
    pub duration_seconds: u64,
}

/// Queued follow-up for a partially saved workout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryEntry {
    pub id: String,
    pub workout_id: String,
    pub user_id: String,
    pub failed_exercises: Vec<String>,
    /// Milliseconds since the UNIX epoch
    pub created_at: i64,
}
