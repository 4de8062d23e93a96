//! User context backed by configuration, switchable at runtime.

use liftlog_core::UserContext;
use parking_lot::RwLock;
use tracing::info;

/// Holds the signed-in user id, if any.
#[derive(Debug, Default)]
pub struct StaticUserContext {
    user_id: RwLock<Option<String>>,
}

impl StaticUserContext {
    pub fn new(user_id: Option<String>) -> Self {
        Self { user_id: RwLock::new(user_id.filter(|id| !id.is_empty())) }
    }

    pub fn sign_in(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        info!(user_id = %user_id, "user signed in");
        *self.user_id.write() = Some(user_id);
    }

    pub fn sign_out(&self) {
        info!("user signed out");
        *self.user_id.write() = None;
    }
}

impl UserContext for StaticUserContext {
    fn current_user_id(&self) -> Option<String> {
        self.user_id.read().clone()
    }
}
