//! Set mutation API
//!
//! Every operation takes the current workout by reference and returns a new
//! workout, so callers holding the previous value never observe a partial
//! update. Unknown ids are reported as [`SessionError::NotFound`].

use rust_decimal::Decimal;

use crate::error::SessionError;
use crate::factory::WorkoutFactory;
use crate::models::{generate_id, Exercise, ExerciseInstance, Set, SetUpdate, Workout};

/// Countdown to start after a set is completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestTimer {
    pub seconds: u32,
}

/// Result of toggling a set's completion
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleOutcome {
    pub workout: Workout,
    pub completed: bool,
    /// Present only when the set went from pending to completed
    pub rest_timer: Option<RestTimer>,
}

fn exercise_position(workout: &Workout, instance_id: &str) -> Result<usize, SessionError> {
    workout
        .exercises
        .iter()
        .position(|e| e.instance_id == instance_id)
        .ok_or_else(|| SessionError::instance_not_found(instance_id))
}

fn set_position(exercise: &ExerciseInstance, set_id: &str) -> Result<usize, SessionError> {
    exercise
        .sets
        .iter()
        .position(|s| s.id == set_id)
        .ok_or_else(|| SessionError::set_not_found(set_id))
}

/// Append a set that repeats the previous set's weight and reps
pub fn add_set(workout: &Workout, instance_id: &str) -> Result<Workout, SessionError> {
    let index = exercise_position(workout, instance_id)?;
    let mut next = workout.clone();
    let exercise = &mut next.exercises[index];

    let (weight, reps) = exercise
        .sets
        .last()
        .map_or((Decimal::ZERO, 0), |last| (last.weight, last.reps));
    exercise.sets.push(Set::new(weight, reps));

    Ok(next)
}

/// Merge the given fields into one set
pub fn update_set(
    workout: &Workout,
    instance_id: &str,
    set_id: &str,
    update: &SetUpdate,
) -> Result<Workout, SessionError> {
    let index = exercise_position(workout, instance_id)?;
    let set_index = set_position(&workout.exercises[index], set_id)?;

    let mut next = workout.clone();
    let set = &mut next.exercises[index].sets[set_index];
    *set = update.apply_to(set);

    Ok(next)
}

/// Remove one set from an exercise
pub fn delete_set(workout: &Workout, instance_id: &str, set_id: &str) -> Result<Workout, SessionError> {
    let index = exercise_position(workout, instance_id)?;
    let set_index = set_position(&workout.exercises[index], set_id)?;

    let mut next = workout.clone();
    next.exercises[index].sets.remove(set_index);

    Ok(next)
}

/// Flip a set's completion. Completing a set yields a rest timer for its rest period.
pub fn toggle_set(workout: &Workout, instance_id: &str, set_id: &str) -> Result<ToggleOutcome, SessionError> {
    let index = exercise_position(workout, instance_id)?;
    let set_index = set_position(&workout.exercises[index], set_id)?;

    let mut next = workout.clone();
    let set = &mut next.exercises[index].sets[set_index];
    set.completed = !set.completed;

    let rest_timer = set.completed.then(|| RestTimer {
        seconds: set.effective_rest(),
    });
    let completed = set.completed;

    Ok(ToggleOutcome {
        workout: next,
        completed,
        rest_timer,
    })
}

/// Link the given exercises into one new superset, replacing any previous membership.
/// Returns the new workout and the superset id.
pub fn create_superset(workout: &Workout, instance_ids: &[&str]) -> Result<(Workout, String), SessionError> {
    if instance_ids.len() < 2 {
        return Err(SessionError::Validation(
            "a superset needs at least two exercises".to_string(),
        ));
    }
    for id in instance_ids {
        exercise_position(workout, id)?;
    }

    let superset_id = generate_id();
    let mut next = workout.clone();
    for exercise in next.exercises.iter_mut() {
        if instance_ids.contains(&exercise.instance_id.as_str()) {
            exercise.superset_id = Some(superset_id.clone());
        }
    }

    Ok((next, superset_id))
}

/// Append a catalog exercise with one empty set
pub fn add_exercise(workout: &Workout, exercise: &Exercise, superset_id: Option<String>) -> (Workout, String) {
    let instance = WorkoutFactory::instance_from_exercise(exercise, superset_id);
    let instance_id = instance.instance_id.clone();

    let mut next = workout.clone();
    next.exercises.push(instance);

    (next, instance_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExerciseType, DEFAULT_REST_SECONDS};
    use rust_decimal_macros::dec;

    fn workout_with(exercises: &[(&str, ExerciseType)]) -> Workout {
        let mut workout = WorkoutFactory::create_empty();
        for (name, exercise_type) in exercises {
            let exercise = Exercise::new(*name, "general", *exercise_type);
            workout = add_exercise(&workout, &exercise, None).0;
        }
        workout
    }

    #[test]
    fn test_add_set_copies_previous_values() {
        let workout = workout_with(&[("Bench", ExerciseType::Weighted)]);
        let instance_id = workout.exercises[0].instance_id.clone();
        let set_id = workout.exercises[0].sets[0].id.clone();

        let workout = update_set(&workout, &instance_id, &set_id, &SetUpdate::new().weight(dec!(135)).reps(8)).unwrap();
        let next = add_set(&workout, &instance_id).unwrap();

        let sets = &next.exercises[0].sets;
        assert_eq!(sets.len(), 2);
        assert_eq!((sets[1].weight, sets[1].reps), (dec!(135), 8));
        assert!(!sets[1].completed);
        assert_ne!(sets[0].id, sets[1].id);
        assert_eq!(workout.exercises[0].sets.len(), 1);
    }

    #[test]
    fn test_add_set_on_empty_exercise_defaults_to_zero() {
        let mut workout = workout_with(&[("Bench", ExerciseType::Weighted)]);
        workout.exercises[0].sets.clear();
        let instance_id = workout.exercises[0].instance_id.clone();

        let next = add_set(&workout, &instance_id).unwrap();
        assert_eq!((next.exercises[0].sets[0].weight, next.exercises[0].sets[0].reps), (Decimal::ZERO, 0));
    }

    #[test]
    fn test_unknown_ids_report_not_found() {
        let workout = workout_with(&[("Bench", ExerciseType::Weighted)]);
        let instance_id = workout.exercises[0].instance_id.clone();

        assert_eq!(add_set(&workout, "missing"), Err(SessionError::instance_not_found("missing")));
        assert_eq!(
            delete_set(&workout, &instance_id, "nope"),
            Err(SessionError::set_not_found("nope"))
        );
        assert!(update_set(&workout, "missing", "nope", &SetUpdate::new()).is_err());
    }

    #[test]
    fn test_set_ids_only_match_within_named_instance() {
        let workout = workout_with(&[("Bench", ExerciseType::Weighted), ("Row", ExerciseType::Weighted)]);
        let bench_id = workout.exercises[0].instance_id.clone();
        let row_set = workout.exercises[1].sets[0].id.clone();

        assert!(delete_set(&workout, &bench_id, &row_set).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_set() {
        let workout = workout_with(&[("Bench", ExerciseType::Weighted)]);
        let instance_id = workout.exercises[0].instance_id.clone();
        let workout = add_set(&workout, &instance_id).unwrap();
        let first = workout.exercises[0].sets[0].id.clone();

        let next = delete_set(&workout, &instance_id, &first).unwrap();
        assert_eq!(next.exercises[0].sets.len(), 1);
        assert!(next.exercises[0].find_set(&first).is_none());
    }

    #[test]
    fn test_toggle_starts_rest_timer_only_on_completion() {
        let workout = workout_with(&[("Bench", ExerciseType::Weighted)]);
        let instance_id = workout.exercises[0].instance_id.clone();
        let set_id = workout.exercises[0].sets[0].id.clone();

        let done = toggle_set(&workout, &instance_id, &set_id).unwrap();
        assert!(done.completed);
        assert_eq!(done.rest_timer, Some(RestTimer { seconds: DEFAULT_REST_SECONDS }));

        let undone = toggle_set(&done.workout, &instance_id, &set_id).unwrap();
        assert!(!undone.completed);
        assert_eq!(undone.rest_timer, None);
    }

    #[test]
    fn test_toggle_uses_custom_rest() {
        let workout = workout_with(&[("Bench", ExerciseType::Weighted)]);
        let instance_id = workout.exercises[0].instance_id.clone();
        let set_id = workout.exercises[0].sets[0].id.clone();
        let workout = update_set(&workout, &instance_id, &set_id, &SetUpdate::new().rest(150)).unwrap();

        let done = toggle_set(&workout, &instance_id, &set_id).unwrap();
        assert_eq!(done.rest_timer, Some(RestTimer { seconds: 150 }));
    }

    #[test]
    fn test_create_superset_overwrites_membership() {
        let workout = workout_with(&[
            ("A", ExerciseType::Weighted),
            ("B", ExerciseType::Weighted),
            ("C", ExerciseType::Bodyweight),
        ]);
        let ids: Vec<String> = workout.exercises.iter().map(|e| e.instance_id.clone()).collect();

        let (workout, first) = create_superset(&workout, &[ids[0].as_str(), ids[1].as_str()]).unwrap();
        let (workout, second) = create_superset(&workout, &[ids[1].as_str(), ids[2].as_str()]).unwrap();

        assert_ne!(first, second);
        assert_eq!(workout.exercises[0].superset_id.as_deref(), Some(first.as_str()));
        assert_eq!(workout.exercises[1].superset_id.as_deref(), Some(second.as_str()));
        assert_eq!(workout.exercises[2].superset_id.as_deref(), Some(second.as_str()));
    }

    #[test]
    fn test_create_superset_is_atomic_on_unknown_id() {
        let workout = workout_with(&[("A", ExerciseType::Weighted)]);
        let id = workout.exercises[0].instance_id.clone();

        assert!(create_superset(&workout, &[id.as_str(), "ghost"]).unwrap_err().is_not_found());
        assert!(matches!(
            create_superset(&workout, &[id.as_str()]),
            Err(SessionError::Validation(_))
        ));
    }
}
