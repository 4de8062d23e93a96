//! Elapsed-time reconciliation against the wall-clock anchor
//!
//! Interval ticks stop while the host is suspended, so when the session
//! becomes visible again the elapsed time is recomputed from `start_time`.

use tracing::debug;

use super::store::WorkoutStore;

/// Whole seconds between `start_millis` and `now_millis`; zero if the clock
/// reads earlier than the anchor.
pub fn elapsed_since(start_millis: i64, now_millis: i64) -> u64 {
    u64::try_from(now_millis.saturating_sub(start_millis) / 1000).unwrap_or(0)
}

/// Host visibility as reported by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Recomputes elapsed time when the session regains visibility.
#[derive(Clone)]
pub struct ElapsedTimeReconciler {
    store: WorkoutStore,
}

impl ElapsedTimeReconciler {
    pub fn new(store: WorkoutStore) -> Self {
        Self { store }
    }

    /// React to a visibility change. Returns the new elapsed time when it was
    /// recomputed.
    pub fn handle_visibility_change(&self, visibility: Visibility) -> Option<u64> {
        self.store.touch_tab_activity();
        match visibility {
            Visibility::Visible => self.reconcile(),
            Visibility::Hidden => None,
        }
    }

    /// Set `elapsed_time = floor((now - start_time) / 1000)` for an active
    /// session with an anchor. Pure recomputation; the value may go down if
    /// the tick accumulator had run ahead.
    pub fn reconcile(&self) -> Option<u64> {
        let now = self.store.clock().now_millis();
        let elapsed = self.store.update("reconcile_elapsed", |state| {
            if !state.is_active {
                return None;
            }
            let elapsed = elapsed_since(state.start_time?, now);
            state.elapsed_time = elapsed;
            Some(elapsed)
        });
        if let Some(elapsed) = elapsed {
            debug!(elapsed_secs = elapsed, "elapsed time reconciled");
        }
        elapsed
    }
}
