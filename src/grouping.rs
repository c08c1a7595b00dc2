//! Superset grouping shared by the session preview, the live view and the exporter

use std::collections::{HashMap, HashSet};

use crate::models::ExerciseInstance;

/// A display/processing group of exercises
#[derive(Debug, Clone, PartialEq)]
pub enum ExerciseGroup<'a> {
    /// A standalone exercise
    Single(&'a ExerciseInstance),
    /// Exercises performed back to back, in workout order
    Superset {
        superset_id: &'a str,
        exercises: Vec<&'a ExerciseInstance>,
    },
}

impl<'a> ExerciseGroup<'a> {
    /// Exercises in this group, in order
    pub fn exercises(&self) -> Vec<&'a ExerciseInstance> {
        match self {
            ExerciseGroup::Single(exercise) => vec![*exercise],
            ExerciseGroup::Superset { exercises, .. } => exercises.clone(),
        }
    }

    pub fn is_superset(&self) -> bool {
        matches!(self, ExerciseGroup::Superset { .. })
    }

    /// Stable key for list rendering: superset id or instance id
    pub fn key(&self) -> &'a str {
        match self {
            ExerciseGroup::Single(exercise) => {
                let exercise: &'a ExerciseInstance = *exercise;
                &exercise.instance_id
            }
            ExerciseGroup::Superset { superset_id, .. } => *superset_id,
        }
    }
}

/// Partition exercises into singles and supersets.
///
/// Each superset is emitted once, at the position of its first member, and
/// contains every instance sharing its id. Singles are de-duplicated by
/// instance id.
pub fn group_exercises(exercises: &[ExerciseInstance]) -> Vec<ExerciseGroup<'_>> {
    let mut members: HashMap<&str, Vec<&ExerciseInstance>> = HashMap::new();
    for exercise in exercises {
        if let Some(superset_id) = superset_of(exercise) {
            members.entry(superset_id).or_default().push(exercise);
        }
    }

    let mut groups = Vec::new();
    let mut seen_supersets: HashSet<&str> = HashSet::new();
    let mut seen_singles: HashSet<&str> = HashSet::new();

    for exercise in exercises {
        match superset_of(exercise) {
            Some(superset_id) => {
                if seen_supersets.insert(superset_id) {
                    groups.push(ExerciseGroup::Superset {
                        superset_id,
                        exercises: members.remove(superset_id).unwrap_or_default(),
                    });
                }
            }
            None => {
                if seen_singles.insert(exercise.instance_id.as_str()) {
                    groups.push(ExerciseGroup::Single(exercise));
                }
            }
        }
    }

    groups
}

/// Superset id of an exercise; an empty id means none
fn superset_of(exercise: &ExerciseInstance) -> Option<&str> {
    exercise.superset_id.as_deref().filter(|id| !id.is_empty())
}
