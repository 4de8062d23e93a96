//! Experience points and aggregate bookkeeping for a saved workout

use liftlog_domain::constants::{XP_PER_COMPLETED_SET, XP_VOLUME_DIVISOR_KG};
use liftlog_domain::{WorkoutAnalytics, WorkoutExercises};

/// `floor(volume / 100) + 10 * completed_sets + floor(duration_minutes)`
pub fn experience_points(total_volume: f64, completed_sets: u32, duration_seconds: u64) -> u64 {
    // Float-to-int `as` saturates; negative or NaN volume yields 0.
    let volume_points = (total_volume / XP_VOLUME_DIVISOR_KG).floor() as u64;
    volume_points
        .saturating_add(XP_PER_COMPLETED_SET.saturating_mul(u64::from(completed_sets)))
        .saturating_add(duration_seconds / 60)
}

/// Aggregate the completed sets of a workout.
pub fn build_analytics(
    workout_id: &str,
    user_id: &str,
    exercises: &WorkoutExercises,
    duration_seconds: u64,
) -> WorkoutAnalytics {
    let total_volume = exercises.completed_volume();
    let completed_sets = u32::try_from(exercises.completed_sets()).unwrap_or(u32::MAX);
    WorkoutAnalytics {
        workout_id: workout_id.to_string(),
        user_id: user_id.to_string(),
        experience_points: experience_points(total_volume, completed_sets, duration_seconds),
        total_volume,
        completed_sets,
        duration_seconds,
    }
}

#[cfg(test)]
mod tests {
    use liftlog_domain::ExerciseSet;

    use super::*;

    #[test]
    fn experience_points_combine_volume_sets_and_minutes() {
        // 1250 kg -> 12, 3 sets -> 30, 45m 59s -> 45
        assert_eq!(experience_points(1250.0, 3, 45 * 60 + 59), 87);
        assert_eq!(experience_points(0.0, 0, 59), 0);
    }

    #[test]
    fn experience_points_saturate_on_absurd_volume() {
        assert_eq!(experience_points(1e25, 3, 60), u64::MAX);
        assert_eq!(experience_points(f64::NAN, 1, 0), 10);
        assert_eq!(experience_points(0.0, u32::MAX, u64::MAX), 42_949_672_950 + u64::MAX / 60);
    }

    #[test]
    fn analytics_only_count_completed_sets() {
        let mut done = ExerciseSet::new(100.0, 5, 90);
        done.completed = true;
        let exercises: WorkoutExercises =
            vec![("Deadlift", vec![done, ExerciseSet::new(100.0, 5, 90)])].into_iter().collect();

        let analytics = build_analytics("w-1", "u-1", &exercises, 600);

        assert_eq!(analytics.completed_sets, 1);
        assert!((analytics.total_volume - 500.0).abs() < f64::EPSILON);
        assert_eq!(analytics.experience_points, 5 + 10 + 10);
    }
}
