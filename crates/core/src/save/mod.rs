//! Save/recovery pipeline for finished workouts

pub mod analytics;
pub mod coordinator;
pub mod ports;

pub use analytics::{build_analytics, experience_points};
pub use coordinator::SaveCoordinator;
pub use ports::{SaveRetryQueue, UserContext, WorkoutBackend};
