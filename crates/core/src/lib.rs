//! # Liftlog Core
//!
//! Business logic for the active workout session - no infrastructure
//! dependencies.
//!
//! This crate contains:
//! - The session state machine ([`WorkoutStore`]) and its post-set flow
//! - Snapshot persistence and elapsed-time reconciliation
//! - The save/recovery coordinator
//! - Port interfaces (traits) for storage, backend, notifications and users
//!
//! ## Architecture Principles
//! - Only depends on `liftlog-common` and `liftlog-domain`
//! - No database, filesystem, or platform code
//! - All external collaborators via traits
//! - Deferred work goes through an injected scheduler

pub mod recommendation;
pub mod save;
pub mod session;

// Re-export specific items to avoid ambiguity
pub use recommendation::{RecommendationEngine, RpeRecommendationEngine};
pub use save::ports::{SaveRetryQueue, UserContext, WorkoutBackend};
pub use save::SaveCoordinator;
pub use session::ports::{KeyValueStorage, Notification, NotificationKind, Notifier};
pub use session::{ElapsedTimeReconciler, RatingOutcome, Visibility, WorkoutStore};
