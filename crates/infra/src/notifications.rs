//! Notifier that emits user-facing messages as tracing events.

use liftlog_core::{Notification, Notifier};
use tracing::{info, warn};

/// Default notifier for headless hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let kind = serde_json::to_value(notification.kind)
            .ok()
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_default();
        if notification.kind.is_warning() {
            warn!(notification_kind = %kind, "{}", notification.message);
        } else {
            info!(notification_kind = %kind, "{}", notification.message);
        }
    }
}
