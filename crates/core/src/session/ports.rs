//! Port interfaces for the workout session
//!
//! These traits define the boundaries between the session engine and
//! infrastructure implementations.

use liftlog_domain::Result;
use serde::{Deserialize, Serialize};

/// Durable key/value storage used for the session snapshot.
///
/// Synchronous by contract: snapshot writes happen inside store actions and
/// must not suspend them.
pub trait KeyValueStorage: Send + Sync {
    /// Read a value; `Ok(None)` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Outcome a user-visible notification is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Started,
    Saving,
    Saved,
    Partial,
    Failed,
    Recovering,
    Recovered,
    SessionRecovered,
    /// Last exercise removed; offers to end the workout.
    EndWorkoutPrompt,
    /// Save refused before any backend call.
    Rejected,
}

impl NotificationKind {
    /// Whether this outcome should be surfaced as a warning.
    pub fn is_warning(self) -> bool {
        matches!(self, Self::Partial | Self::Failed | Self::Rejected)
    }
}

/// A fire-and-forget user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

/// Toast/notification sink. Not required for correctness.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Notifier that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _notification: Notification) {}
}
