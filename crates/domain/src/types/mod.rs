//! Domain types and models

pub mod recommendation;
pub mod save;
pub mod session;
pub mod workout;

pub use recommendation::SetRecommendation;
pub use save::{
    RetryEntry, SaveOutcome, SaveProgress, SaveStep, SetRecord, WorkoutAnalytics, WorkoutError,
    WorkoutErrorType, WorkoutRecord,
};
pub use session::{new_session_id, PostSetFlow, SessionState, WorkoutStatus};
pub use workout::{
    ExerciseEntry, ExerciseSet, PreviousValues, SetMetadata, SetUpdate, TrainingConfig,
    WorkoutExercises,
};
