//! Next-set recommendations derived from perceived exertion

use liftlog_domain::constants::{
    HEAVY_REST_BONUS_SECONDS, MAX_EFFORT_REST_BONUS_SECONDS, MAX_EFFORT_WEIGHT_FACTOR,
    WEIGHT_INCREMENT_KG,
};
use liftlog_domain::{ExerciseSet, SetRecommendation};

/// Strategy that proposes targets for the set following a rated one.
///
/// Implementations must be pure: same inputs, same recommendation.
pub trait RecommendationEngine: Send + Sync {
    /// `history` holds the exercise's completed sets in order, including
    /// `completed`.
    fn next_set_recommendation(
        &self,
        completed: &ExerciseSet,
        rpe: u8,
        exercise: &str,
        history: &[ExerciseSet],
    ) -> SetRecommendation;
}

/// Default engine: progress easy sets, hold moderate ones, back off from
/// maximal efforts.
#[derive(Debug, Clone, Copy, Default)]
pub struct RpeRecommendationEngine;

impl RecommendationEngine for RpeRecommendationEngine {
    fn next_set_recommendation(
        &self,
        completed: &ExerciseSet,
        rpe: u8,
        _exercise: &str,
        _history: &[ExerciseSet],
    ) -> SetRecommendation {
        let base = SetRecommendation::new(completed.weight, completed.reps, completed.rest_time);
        match rpe {
            0..=6 if completed.weight <= 0.0 => SetRecommendation {
                reps: completed.reps.saturating_add(1),
                ..base
            }
            .with_message("Felt easy: add a rep"),
            0..=6 => SetRecommendation { weight: completed.weight + WEIGHT_INCREMENT_KG, ..base }
                .with_message(format!("Felt easy: add {WEIGHT_INCREMENT_KG} kg")),
            7 | 8 => base.with_message("Right on target: keep it up"),
            9 => SetRecommendation {
                rest_time: completed.rest_time.saturating_add(HEAVY_REST_BONUS_SECONDS),
                ..base
            }
            .with_message(format!("Tough set: rest {HEAVY_REST_BONUS_SECONDS}s longer")),
            _ => SetRecommendation {
                weight: back_off(completed.weight),
                rest_time: completed.rest_time.saturating_add(MAX_EFFORT_REST_BONUS_SECONDS),
                ..base
            }
            .with_message("Max effort: lighten the load and rest longer"),
        }
    }
}

/// Reduce to the max-effort factor, rounded to the nearest plate increment.
fn back_off(weight: f64) -> f64 {
    let reduced = weight * MAX_EFFORT_WEIGHT_FACTOR;
    ((reduced / WEIGHT_INCREMENT_KG).round() * WEIGHT_INCREMENT_KG).max(0.0)
}
