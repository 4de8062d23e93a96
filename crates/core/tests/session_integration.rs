//! Integration tests for the workout session state machine
//!
//! Exercises the store through its public actions with deterministic time:
//! set completion, the post-set flow, focus bookkeeping, persistence and
//! elapsed-time reconciliation.

mod support;

use std::time::Duration;

use liftlog_core::session::SessionSnapshot;
use liftlog_core::{ElapsedTimeReconciler, NotificationKind, RatingOutcome, Visibility};
use liftlog_domain::constants::DEFAULT_SNAPSHOT_KEY;
use liftlog_domain::{PostSetFlow, SessionState, WorkoutStatus};
use support::{exercises, set, Harness, MemoryStorage, T0_MILLIS};

fn stored_snapshot(state: &SessionState) -> String {
    SessionSnapshot::from_state(state).encode().expect("snapshot encodes")
}

/// Validates completing a set defers the post-set flow by one tick
///
/// Assertions:
/// - The set is completed immediately and pointers are recorded
/// - The flow stays idle until the scheduler runs, then enters `rating`
/// - The rest timer is not active after completion
#[test]
fn test_complete_set_defers_rating() {
    let h = Harness::new();
    h.store.set_exercises(exercises(vec![("Squat", vec![set(60.0, 5, 90)])]));
    h.store.start_workout().expect("idle start");

    h.store.handle_complete_set("Squat", 0);

    let state = h.store.state();
    assert!(state.exercises.set("Squat", 0).is_some_and(|s| s.completed));
    assert_eq!(state.last_completed_exercise.as_deref(), Some("Squat"));
    assert_eq!(state.post_set_flow, PostSetFlow::Idle);
    assert!(!state.rest_timer_active);

    h.flush();
    let state = h.store.state();
    assert_eq!(state.post_set_flow, PostSetFlow::Rating);
    assert!(!state.rest_timer_active);
}

/// Validates completion is idempotent
///
/// Assertions:
/// - A second call leaves the set completed
/// - Only one post-set hand-off is scheduled
#[test]
fn test_complete_set_twice_is_idempotent() {
    let h = Harness::new();
    h.store.set_exercises(exercises(vec![("Squat", vec![set(60.0, 5, 90), set(60.0, 5, 90)])]));

    h.store.handle_complete_set("Squat", 0);
    h.store.handle_complete_set("Squat", 0);

    assert_eq!(h.scheduler.pending(), 1);
    assert_eq!(h.scheduler.run_pending(), 1);
    assert!(h.store.read(|s| s.exercises.set("Squat", 0).is_some_and(|set| set.completed)));
}

/// Validates completing a missing set is a silent no-op
#[test]
fn test_complete_missing_set_is_noop() {
    let h = Harness::new();
    h.store.set_exercises(exercises(vec![("Squat", vec![set(60.0, 5, 90)])]));
    let before = h.store.state();

    h.store.handle_complete_set("Squat", 3);
    h.store.handle_complete_set("Deadlift", 0);

    assert_eq!(h.scheduler.pending(), 0);
    assert_eq!(h.store.state(), before);
}

/// Validates the rest timer starts only after the rating step
///
/// Assertions:
/// - `rating` precedes `resting`
/// - rest time is seeded from the completed set
/// - rpe is stored on the completed set
#[test]
fn test_rating_then_rest_ordering() {
    let h = Harness::new();
    h.store.set_exercises(exercises(vec![("Squat", vec![set(60.0, 5, 120)])]));
    h.store.handle_complete_set("Squat", 0);
    h.flush();
    assert!(!h.store.read(|s| s.rest_timer_active));

    let outcome = h.store.submit_set_rating(7).expect("valid rpe");

    assert_eq!(outcome, RatingOutcome::Resting { adjusted: None });
    let state = h.store.state();
    assert_eq!(state.post_set_flow, PostSetFlow::Resting);
    assert!(state.rest_timer_active);
    assert_eq!(state.current_rest_time, 120);
    assert_eq!(state.exercises.set("Squat", 0).and_then(|s| s.rpe), Some(7));
}

/// Validates a rating outside the rating step changes nothing
#[test]
fn test_rating_outside_flow_is_ignored() {
    let h = Harness::new();
    h.store.set_exercises(exercises(vec![("Squat", vec![set(60.0, 5, 90)])]));

    let outcome = h.store.submit_set_rating(8).expect("valid rpe");

    assert_eq!(outcome, RatingOutcome::NotRating);
    assert!(h.store.read(|s| s.exercises.set("Squat", 0).is_some_and(|set| set.rpe.is_none())));
}

/// Validates rpe bounds
#[test]
fn test_rating_out_of_range_is_rejected() {
    let h = Harness::new();
    assert!(h.store.submit_set_rating(0).is_err());
    assert!(h.store.submit_set_rating(11).is_err());
}

/// Validates the auto-adjust audit trail on the next set
///
/// Assertions:
/// - An easy rating raises the next set by 2.5 kg
/// - `metadata.previousValues.weight` holds the replaced value
#[test]
fn test_easy_rating_adjusts_next_set_with_audit_trail() {
    let h = Harness::new();
    h.store.set_exercises(exercises(vec![("Bench", vec![set(100.0, 8, 90), set(100.0, 8, 90)])]));
    h.store.handle_complete_set("Bench", 0);
    h.flush();

    let outcome = h.store.submit_set_rating(5).expect("valid rpe");

    assert!(matches!(outcome, RatingOutcome::Resting { adjusted: Some(_) }));
    let next = h.store.read(|s| s.exercises.set("Bench", 1).cloned()).expect("next set");
    assert_eq!(next.weight, 102.5);
    let metadata = next.metadata.expect("audit metadata");
    assert!(metadata.auto_adjusted);
    assert_eq!(metadata.previous_values.and_then(|p| p.weight), Some(100.0));
}

/// Validates a moderate rating leaves the next set without metadata
#[test]
fn test_moderate_rating_leaves_next_set_untouched() {
    let h = Harness::new();
    h.store.set_exercises(exercises(vec![("Bench", vec![set(100.0, 8, 90), set(100.0, 8, 90)])]));
    h.store.handle_complete_set("Bench", 0);
    h.flush();

    h.store.submit_set_rating(8).expect("valid rpe");

    let next = h.store.read(|s| s.exercises.set("Bench", 1).cloned()).expect("next set");
    assert_eq!(next, set(100.0, 8, 90));
}

/// Validates a hard rating on a set already at the maximum rest time
///
/// Assertions:
/// - The rating completes and the flow moves to `resting`
/// - The next set's rest time saturates instead of overflowing
#[test]
fn test_hard_rating_on_maximum_rest_time_saturates() {
    let h = Harness::new();
    h.store.set_exercises(exercises(vec![(
        "Row",
        vec![set(80.0, 10, u32::MAX), set(80.0, 10, u32::MAX - 5)],
    )]));
    h.store.handle_complete_set("Row", 0);
    h.flush();

    let outcome = h.store.submit_set_rating(9).expect("valid rpe");

    assert!(matches!(outcome, RatingOutcome::Resting { .. }));
    let state = h.store.state();
    assert_eq!(state.post_set_flow, PostSetFlow::Resting);
    assert_eq!(state.current_rest_time, u32::MAX);
    assert_eq!(state.exercises.set("Row", 1).map(|s| s.rest_time), Some(u32::MAX));
}

/// Validates the post-set flow fails closed when its target disappears
#[test]
fn test_post_set_flow_fails_closed_on_deleted_exercise() {
    let h = Harness::new();
    h.store.set_exercises(exercises(vec![
        ("Squat", vec![set(60.0, 5, 90)]),
        ("Bench", vec![set(40.0, 8, 60)]),
    ]));
    h.store.handle_complete_set("Squat", 0);
    h.store.delete_exercise("Squat");

    h.flush();

    let state = h.store.state();
    assert_eq!(state.post_set_flow, PostSetFlow::Idle);
    assert!(state.last_completed_exercise.is_none());
}

/// Validates the rest timer counts down and exits the flow
///
/// Assertions:
/// - Ticks reduce the remaining time
/// - Reaching the target returns the flow to idle
/// - Reset restarts the count; skip ends the rest
#[test]
fn test_rest_timer_tick_reset_and_skip() {
    let h = Harness::new();
    h.store.set_exercises(exercises(vec![("Row", vec![set(50.0, 10, 3), set(50.0, 10, 3)])]));
    h.store.handle_complete_set("Row", 0);
    h.flush();
    h.store.submit_set_rating(7).expect("valid rpe");

    assert_eq!(h.store.tick_rest_timer(), 2);
    h.store.reset_rest_timer();
    assert_eq!(h.store.rest_remaining(), 3);
    assert_eq!(h.store.tick_rest_timer(), 2);
    assert_eq!(h.store.tick_rest_timer(), 1);
    assert_eq!(h.store.tick_rest_timer(), 0);
    assert_eq!(h.store.read(|s| s.post_set_flow), PostSetFlow::Idle);
    assert!(!h.store.read(|s| s.rest_timer_active));

    h.store.handle_complete_set("Row", 1);
    h.flush();
    h.store.submit_set_rating(7).expect("valid rpe");
    h.store.skip_rest();
    assert_eq!(h.store.read(|s| s.post_set_flow), PostSetFlow::Idle);
}

/// Validates deleting the focused exercise clears focus
///
/// Assertions:
/// - focus pointers are cleared for every deletion order
/// - deleting the last exercise prompts to end the workout
#[test]
fn test_delete_focused_exercise_clears_focus() {
    let h = Harness::new();
    h.store.set_exercises(exercises(vec![
        ("Squat", vec![set(60.0, 5, 90)]),
        ("Bench", vec![set(40.0, 8, 60)]),
    ]));
    assert!(h.store.set_focus("Bench", Some(0)));

    assert!(h.store.delete_exercise("Squat"));
    assert_eq!(h.store.read(|s| s.focused_exercise.clone()).as_deref(), Some("Bench"));

    assert!(h.store.delete_exercise("Bench"));
    let state = h.store.state();
    assert!(state.focused_exercise.is_none());
    assert!(state.focused_set_index.is_none());
    assert_eq!(h.notifier.count(NotificationKind::EndWorkoutPrompt), 1);
    assert_eq!(state.workout_status, WorkoutStatus::Idle);
}

/// Validates reset wipes everything and cancels deferred work
///
/// Assertions:
/// - exercises empty, workout id cleared, new session id, flow idle
/// - a pending post-set hand-off never fires against the new session
#[test]
fn test_reset_session_wipes_state() {
    let h = Harness::new();
    h.store.set_exercises(exercises(vec![("Squat", vec![set(60.0, 5, 90)])]));
    h.store.start_workout().expect("idle start");
    h.store.mark_as_partial_save("workout-9", Vec::new());
    h.store.handle_complete_set("Squat", 0);
    let before = h.store.session_id();

    h.store.reset_session();
    h.flush();

    let state = h.store.state();
    assert!(state.exercises.is_empty());
    assert!(state.workout_id.is_none());
    assert_ne!(state.session_id, before);
    assert_eq!(state.post_set_flow, PostSetFlow::Idle);
    assert_eq!(state.workout_status, WorkoutStatus::Idle);
    assert_eq!(h.store.pending_tasks(), 0);
}

/// Validates every mutation is persisted
#[test]
fn test_mutations_write_snapshot() {
    let h = Harness::new();
    h.store.set_exercises(exercises(vec![("Squat", vec![set(60.0, 5, 90)])]));
    h.store.set_last_active_route(Some("/training-session".into()));

    let raw = h.storage.raw(DEFAULT_SNAPSHOT_KEY).expect("snapshot written");
    let snapshot = SessionSnapshot::decode(&raw).expect("snapshot decodes");
    assert_eq!(snapshot.last_active_route.as_deref(), Some("/training-session"));
    assert_eq!(snapshot.exercises.len(), 1);
}

/// Validates snapshot write failures do not break actions
#[test]
fn test_snapshot_write_failure_is_swallowed() {
    let h = Harness::new();
    h.storage.fail_writes(true);

    h.store.set_exercises(exercises(vec![("Squat", vec![set(60.0, 5, 90)])]));

    assert_eq!(h.store.read(|s| s.exercises.len()), 1);
}

/// Validates idle ticks leave the snapshot alone
///
/// Assertions:
/// - `tick` and `tick_rest_timer` outside a workout or rest period do not write
/// - An active workout tick changes the elapsed time and writes once
#[test]
fn test_idle_ticks_do_not_rewrite_snapshot() {
    let h = Harness::new();
    h.store.set_exercises(exercises(vec![("Squat", vec![set(60.0, 5, 90)])]));
    let after_setup = h.storage.writes();
    assert!(after_setup > 0);

    for _ in 0..5 {
        h.store.tick();
        h.store.tick_rest_timer();
    }
    assert_eq!(h.storage.writes(), after_setup);

    h.store.start_workout().expect("idle start");
    let after_start = h.storage.writes();
    h.store.tick();
    h.store.tick_rest_timer();

    assert_eq!(h.storage.writes(), after_start + 1);
}

/// Validates a failed snapshot write is retried by the next action
#[test]
fn test_failed_snapshot_write_is_retried() {
    let h = Harness::new();
    h.storage.fail_writes(true);
    h.store.set_exercises(exercises(vec![("Squat", vec![set(60.0, 5, 90)])]));
    assert!(h.storage.raw(DEFAULT_SNAPSHOT_KEY).is_none());

    h.storage.fail_writes(false);
    h.store.tick();

    let raw = h.storage.raw(DEFAULT_SNAPSHOT_KEY).expect("snapshot written");
    let snapshot = SessionSnapshot::decode(&raw).expect("snapshot decodes");
    assert_eq!(snapshot.exercises.len(), 1);
}

/// Validates rehydration recomputes elapsed time monotonically
///
/// Assertions:
/// - A stale counter grows to the wall-clock elapsed time (90 s)
/// - A counter ahead of the wall clock is never reduced
/// - A "session recovered" notification is emitted
#[test]
fn test_rehydrate_elapsed_is_monotonic() {
    let mut stored = SessionState::new("stored-session", 0);
    stored.is_active = true;
    stored.workout_status = WorkoutStatus::Active;
    stored.start_time = Some(T0_MILLIS as i64 - 90_000);
    stored.elapsed_time = 30;
    stored.exercises = exercises(vec![("Squat", vec![set(60.0, 5, 90)])]);

    let h = Harness::with_storage(MemoryStorage::with_value(DEFAULT_SNAPSHOT_KEY, &stored_snapshot(&stored)));
    assert!(h.store.rehydrate());
    assert_eq!(h.store.read(|s| s.elapsed_time), 90);
    assert_eq!(h.store.session_id(), "stored-session");
    assert_eq!(h.notifier.count(NotificationKind::SessionRecovered), 1);

    stored.elapsed_time = 500;
    let h = Harness::with_storage(MemoryStorage::with_value(DEFAULT_SNAPSHOT_KEY, &stored_snapshot(&stored)));
    assert!(h.store.rehydrate());
    assert_eq!(h.store.read(|s| s.elapsed_time), 500);
}

/// Validates corrupt and unsupported snapshots fall back to idle
#[test]
fn test_rehydrate_bad_snapshot_falls_back_to_idle() {
    for raw in ["{not json", r#"{"version": 42}"#, r#"{"version": 2, "exercises": 7}"#] {
        let h = Harness::with_storage(MemoryStorage::with_value(DEFAULT_SNAPSHOT_KEY, raw));

        assert!(!h.store.rehydrate());
        assert_eq!(h.store.status(), WorkoutStatus::Idle);
        assert!(h.store.read(|s| s.exercises.is_empty()));
    }
}

/// Validates a session persisted as saved does not come back
#[test]
fn test_rehydrate_saved_session_resets() {
    let mut stored = SessionState::new("saved-session", 0);
    stored.workout_status = WorkoutStatus::Saved;
    stored.workout_id = Some("workout-1".into());
    stored.exercises = exercises(vec![("Squat", vec![set(60.0, 5, 90)])]);
    let h = Harness::with_storage(MemoryStorage::with_value(DEFAULT_SNAPSHOT_KEY, &stored_snapshot(&stored)));

    assert!(!h.store.rehydrate());

    let state = h.store.state();
    assert!(state.exercises.is_empty());
    assert_ne!(state.session_id, "saved-session");
}

/// Validates the reconciler recomputes elapsed time on visibility
///
/// Assertions:
/// - Hidden does not recompute
/// - Visible recomputes from the wall-clock anchor
/// - Inactive sessions are left alone
#[test]
fn test_reconciler_recomputes_on_visible() {
    let h = Harness::new();
    let reconciler = ElapsedTimeReconciler::new(h.store.clone());
    h.store.start_workout().expect("idle start");
    h.store.tick();

    h.clock.advance(Duration::from_millis(125_400));
    assert_eq!(reconciler.handle_visibility_change(Visibility::Hidden), None);
    assert_eq!(h.store.read(|s| s.elapsed_time), 1);

    assert_eq!(reconciler.handle_visibility_change(Visibility::Visible), Some(125));
    assert_eq!(h.store.read(|s| s.elapsed_time), 125);
    assert_eq!(h.store.read(|s| s.last_tab_activity), T0_MILLIS as i64 + 125_400);

    h.store.end_workout();
    assert_eq!(reconciler.reconcile(), None);
}
