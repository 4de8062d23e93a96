//! Active workout session: state machine, post-set flow, snapshot
//! persistence and elapsed-time reconciliation

pub mod persistence;
pub mod ports;
pub mod post_set;
pub mod reconciler;
pub mod store;

pub use persistence::{SessionSnapshot, SnapshotError};
pub use ports::{KeyValueStorage, Notification, NotificationKind, Notifier, SilentNotifier};
pub use post_set::{apply_recommendation, RatingOutcome};
pub use reconciler::{elapsed_since, ElapsedTimeReconciler, Visibility};
pub use store::{WorkoutStore, WorkoutStoreBuilder};
