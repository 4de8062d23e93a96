//! Post-set feedback flow: `idle → rating → resting → idle`
//!
//! Completing a set only records the pointer; the rest timer starts after a
//! rating has been captured and the next set has been adjusted.

use liftlog_domain::constants::{RPE_MAX, RPE_MIN};
use liftlog_domain::{
    ExerciseSet, LiftlogError, PostSetFlow, PreviousValues, Result, SessionState, SetMetadata,
    SetRecommendation,
};
use tracing::{debug, info};

use super::store::WorkoutStore;

/// Write `recommendation` onto `set` if any target differs.
///
/// On change, stamps `metadata.autoAdjusted` with the replaced values of the
/// fields that moved. Returns whether the set was modified.
pub fn apply_recommendation(set: &mut ExerciseSet, recommendation: &SetRecommendation) -> bool {
    let mut previous = PreviousValues::default();
    if set.weight != recommendation.weight {
        previous.weight = Some(set.weight);
    }
    if set.reps != recommendation.reps {
        previous.reps = Some(set.reps);
    }
    if set.rest_time != recommendation.rest_time {
        previous.rest_time = Some(set.rest_time);
    }
    if previous == PreviousValues::default() {
        return false;
    }

    set.weight = recommendation.weight;
    set.reps = recommendation.reps;
    set.rest_time = recommendation.rest_time;
    set.metadata = Some(SetMetadata::auto_adjusted(previous));
    true
}

/// Result of a rating submission.
#[derive(Debug, Clone, PartialEq)]
pub enum RatingOutcome {
    /// Rating stored and rest started. Carries the recommendation applied to
    /// the next set, if there was one and it changed anything.
    Resting { adjusted: Option<SetRecommendation> },
    /// The flow was not collecting a rating.
    NotRating,
    /// The completed-set pointer was stale; the flow returned to idle.
    Abandoned,
}

impl WorkoutStore {
    /// Enter `rating` for the last completed set, or fail closed to `idle`
    /// when the pointer no longer references a set.
    pub fn start_post_set_flow(&self) {
        let entered = self.update("start_post_set_flow", |state| {
            if state.last_completed_set().is_none() {
                state.clear_post_set_flow();
                return false;
            }
            state.post_set_flow = PostSetFlow::Rating;
            state.rest_timer_active = false;
            state.rest_elapsed = 0;
            true
        });
        if entered {
            debug!("post-set flow awaiting rating");
        } else {
            debug!("post-set flow pointer invalid; back to idle");
        }
    }

    /// Store the rating on the completed set, adjust the next set of the same
    /// exercise, then start the rest timer seeded from the completed set.
    pub fn submit_set_rating(&self, rpe: u8) -> Result<RatingOutcome> {
        if !(RPE_MIN..=RPE_MAX).contains(&rpe) {
            return Err(LiftlogError::InvalidInput(format!(
                "rpe must be between {RPE_MIN} and {RPE_MAX}, got {rpe}"
            )));
        }

        let engine = self.inner.engine.clone();
        let outcome = self.update("submit_set_rating", |state| {
            if state.post_set_flow != PostSetFlow::Rating {
                return RatingOutcome::NotRating;
            }
            let (Some(exercise), Some(index)) =
                (state.last_completed_exercise.clone(), state.last_completed_set_index)
            else {
                state.clear_post_set_flow();
                return RatingOutcome::Abandoned;
            };
            let Some(set) = state.exercises.set_mut(&exercise, index) else {
                state.clear_post_set_flow();
                return RatingOutcome::Abandoned;
            };
            set.rpe = Some(rpe);
            let completed = set.clone();

            let mut adjusted = None;
            if state.exercises.set(&exercise, index + 1).is_some() {
                let history = completed_history(state, &exercise);
                let recommendation =
                    engine.next_set_recommendation(&completed, rpe, &exercise, &history);
                if let Some(next) = state.exercises.set_mut(&exercise, index + 1) {
                    if apply_recommendation(next, &recommendation) {
                        adjusted = Some(recommendation);
                    }
                }
            }

            state.post_set_flow = PostSetFlow::Resting;
            state.rest_timer_active = true;
            state.current_rest_time = completed.rest_time;
            state.rest_elapsed = 0;
            RatingOutcome::Resting { adjusted }
        });

        match &outcome {
            RatingOutcome::Resting { adjusted } => info!(
                rpe,
                adjusted = adjusted.is_some(),
                "set rated; rest timer started"
            ),
            RatingOutcome::NotRating => debug!(rpe, "rating ignored outside rating step"),
            RatingOutcome::Abandoned => debug!(rpe, "rating target vanished; flow reset"),
        }
        Ok(outcome)
    }

    /// Apply a recommendation to a specific set. Returns whether it changed.
    pub fn apply_set_recommendation(
        &self,
        exercise: &str,
        set_index: usize,
        recommendation: &SetRecommendation,
    ) -> bool {
        self.update("apply_set_recommendation", |state| {
            state
                .exercises
                .set_mut(exercise, set_index)
                .is_some_and(|set| apply_recommendation(set, recommendation))
        })
    }

    /// One-second tick of the rest timer. Completes the rest when the target
    /// is reached. Returns the seconds left.
    pub fn tick_rest_timer(&self) -> u32 {
        let (remaining, finished) = self.update("tick_rest_timer", |state| {
            if !state.rest_timer_active {
                return (0, false);
            }
            state.rest_elapsed = state.rest_elapsed.saturating_add(1);
            if state.rest_elapsed >= state.current_rest_time {
                state.clear_post_set_flow();
                return (0, true);
            }
            (state.rest_remaining(), false)
        });
        if finished {
            debug!("rest complete");
        }
        remaining
    }

    /// Force-complete the rest period.
    pub fn skip_rest(&self) {
        self.update("skip_rest", |state| {
            if state.post_set_flow == PostSetFlow::Resting {
                state.clear_post_set_flow();
            }
        });
    }

    /// Restart the rest count while staying in `resting`.
    pub fn reset_rest_timer(&self) {
        self.update("reset_rest_timer", |state| {
            if state.post_set_flow == PostSetFlow::Resting {
                state.rest_elapsed = 0;
                state.rest_timer_active = true;
            }
        });
    }

    pub fn rest_remaining(&self) -> u32 {
        self.read(SessionState::rest_remaining)
    }
}

fn completed_history(state: &SessionState, exercise: &str) -> Vec<ExerciseSet> {
    state
        .exercises
        .get(exercise)
        .map(|sets| sets.iter().filter(|set| set.completed).cloned().collect())
        .unwrap_or_default()
}
