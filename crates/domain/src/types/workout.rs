//! Exercise and set types for an in-progress workout

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Target values a recommendation replaced, kept for "changed from" badges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_time: Option<u32>,
}

/// Audit trail attached to a set by the recommendation engine.
///
/// `previous_values` is only present when `auto_adjusted` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetMetadata {
    pub auto_adjusted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_values: Option<PreviousValues>,
}

impl SetMetadata {
    /// Metadata for a set whose targets were rewritten.
    pub fn auto_adjusted(previous: PreviousValues) -> Self {
        Self { auto_adjusted: true, previous_values: Some(previous) }
    }
}

/// One set of one exercise.
///
/// Weight is stored in kilograms; unit conversion happens at the display
/// boundary only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSet {
    pub weight: f64,
    pub reps: u32,
    pub rest_time: u32,
    pub completed: bool,
    #[serde(default)]
    pub is_editing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpe: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SetMetadata>,
}

impl ExerciseSet {
    /// A fresh, not yet completed set.
    pub fn new(weight: f64, reps: u32, rest_time: u32) -> Self {
        Self {
            weight,
            reps,
            rest_time,
            completed: false,
            is_editing: false,
            rpe: None,
            metadata: None,
        }
    }

    /// Same targets as `self`, with completion, rating and audit state cleared.
    pub fn next_from(&self) -> Self {
        Self::new(self.weight, self.reps, self.rest_time)
    }

    /// Weight moved in this set (`weight * reps`).
    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }

    /// A set is well formed when its numbers are usable for persistence.
    pub fn is_well_formed(&self) -> bool {
        self.weight.is_finite() && self.weight >= 0.0
    }
}

/// Partial edit of a set's targets. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUpdate {
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub rest_time: Option<u32>,
    pub is_editing: Option<bool>,
}

impl SetUpdate {
    /// Write the present fields onto `set`. Returns whether anything changed.
    pub fn apply_to(&self, set: &mut ExerciseSet) -> bool {
        let before = set.clone();
        if let Some(weight) = self.weight {
            set.weight = weight;
        }
        if let Some(reps) = self.reps {
            set.reps = reps;
        }
        if let Some(rest_time) = self.rest_time {
            set.rest_time = rest_time;
        }
        if let Some(is_editing) = self.is_editing {
            set.is_editing = is_editing;
        }
        *set != before
    }
}

/// One exercise and its ordered sets. Set order is index order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEntry {
    pub name: String,
    pub sets: Vec<ExerciseSet>,
}

/// Exercises of a session keyed by name, in insertion order.
///
/// The exercise name is the primary key within a session; inserting an
/// existing name replaces its sets in place without moving it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutExercises {
    entries: Vec<ExerciseEntry>,
}

impl WorkoutExercises {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&[ExerciseSet]> {
        self.position(name).map(|idx| self.entries[idx].sets.as_slice())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Vec<ExerciseSet>> {
        let idx = self.position(name)?;
        Some(&mut self.entries[idx].sets)
    }

    /// Look up a single set; `None` when either the exercise or index is
    /// missing.
    pub fn set(&self, name: &str, index: usize) -> Option<&ExerciseSet> {
        self.get(name).and_then(|sets| sets.get(index))
    }

    pub fn set_mut(&mut self, name: &str, index: usize) -> Option<&mut ExerciseSet> {
        self.get_mut(name).and_then(|sets| sets.get_mut(index))
    }

    /// Insert or replace the sets for `name`. Returns the previous sets.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        sets: Vec<ExerciseSet>,
    ) -> Option<Vec<ExerciseSet>> {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => Some(std::mem::replace(&mut self.entries[idx].sets, sets)),
            None => {
                self.entries.push(ExerciseEntry { name, sets });
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<ExerciseSet>> {
        let idx = self.position(name)?;
        Some(self.entries.remove(idx).sets)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ExerciseSet])> {
        self.entries.iter().map(|entry| (entry.name.as_str(), entry.sets.as_slice()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn total_sets(&self) -> usize {
        self.entries.iter().map(|entry| entry.sets.len()).sum()
    }

    pub fn completed_sets(&self) -> usize {
        self.entries.iter().flat_map(|entry| entry.sets.iter()).filter(|set| set.completed).count()
    }

    /// Total volume of completed sets.
    pub fn completed_volume(&self) -> f64 {
        self.entries
            .iter()
            .flat_map(|entry| entry.sets.iter())
            .filter(|set| set.completed)
            .map(ExerciseSet::volume)
            .sum()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name == name)
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<ExerciseSet>)> for WorkoutExercises {
    fn from_iter<T: IntoIterator<Item = (S, Vec<ExerciseSet>)>>(iter: T) -> Self {
        let mut exercises = Self::new();
        for (name, sets) in iter {
            exercises.insert(name, sets);
        }
        exercises
    }
}

/// Pre-workout configuration carried into the session. Read-only to the
/// session engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingConfig {
    pub training_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Planned duration in minutes.
    #[serde(default)]
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_focus: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TrainingConfig {
    pub fn new(training_type: impl Into<String>) -> Self {
        Self { training_type: training_type.into(), ..Self::default() }
    }
}
