//! Workout construction from templates, from scratch, and from set targets

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{
    generate_id, Exercise, ExerciseBlueprint, ExerciseInstance, PlannedSet, Set, Template, Workout,
    DEFAULT_REST_SECONDS,
};

/// Per-exercise set target chosen on the setup screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOverride {
    /// Position of the exercise in the workout
    pub exercise_index: usize,
    /// Number of sets to generate
    pub target_sets: u32,
    /// Reps for each generated set
    pub target_reps: u32,
}

/// Builds workouts for a new session
pub struct WorkoutFactory;

impl WorkoutFactory {
    /// Freestyle workout with no exercises
    pub fn create_empty() -> Workout {
        Self::create_empty_at(Utc::now())
    }

    pub fn create_empty_at(start_time: DateTime<Utc>) -> Workout {
        Workout {
            id: generate_id(),
            start_time,
            end_time: None,
            duration_minutes: None,
            template_id: None,
            template_name: None,
            workout_type: None,
            exercises: Vec::new(),
        }
    }

    /// Instantiate a workout from a template, or an empty one when there is none
    pub fn create_from_template(template: Option<&Template>) -> Workout {
        Self::create_from_template_at(template, Utc::now())
    }

    pub fn create_from_template_at(template: Option<&Template>, start_time: DateTime<Utc>) -> Workout {
        let Some(template) = template else {
            return Self::create_empty_at(start_time);
        };

        debug!(
            template_id = %template.id,
            exercises = template.exercises.len(),
            "Creating workout from template"
        );

        Workout {
            id: generate_id(),
            start_time,
            end_time: None,
            duration_minutes: None,
            template_id: Some(template.id.clone()),
            template_name: Some(template.name.clone()),
            workout_type: template.workout_type.clone(),
            exercises: template.exercises.iter().map(Self::instance_from_blueprint).collect(),
        }
    }

    /// Replace the set list of each referenced exercise with generated target sets.
    /// Exercises without an override are returned unchanged.
    pub fn apply_config(workout: &Workout, overrides: &[TargetOverride]) -> Workout {
        let mut configured = workout.clone();

        for config in overrides {
            match configured.exercises.get_mut(config.exercise_index) {
                Some(exercise) => {
                    exercise.sets = (0..config.target_sets)
                        .map(|_| Set::new(Decimal::ZERO, config.target_reps))
                        .collect();
                }
                None => warn!(
                    index = config.exercise_index,
                    exercises = workout.exercises.len(),
                    "Ignoring target override for missing exercise"
                ),
            }
        }

        configured
    }

    /// Session instance for a catalog exercise added mid-workout
    pub fn instance_from_exercise(exercise: &Exercise, superset_id: Option<String>) -> ExerciseInstance {
        ExerciseInstance {
            instance_id: generate_id(),
            exercise_id: Some(exercise.id.clone()),
            name: exercise.name.clone(),
            category: exercise.category.clone(),
            exercise_type: exercise.exercise_type,
            equipment_options: exercise.equipment_options.clone(),
            active_equipment: None,
            superset_id,
            sets: vec![Self::default_set()],
        }
    }

    fn instance_from_blueprint(blueprint: &ExerciseBlueprint) -> ExerciseInstance {
        let sets = if blueprint.sets.is_empty() {
            vec![Self::default_set()]
        } else {
            blueprint.sets.iter().map(Self::set_from_plan).collect()
        };

        ExerciseInstance {
            instance_id: generate_id(),
            exercise_id: blueprint.exercise_id.clone(),
            name: blueprint.name.clone(),
            category: blueprint.category.clone(),
            exercise_type: blueprint.exercise_type,
            equipment_options: blueprint.equipment_options.clone(),
            active_equipment: blueprint.active_equipment,
            superset_id: blueprint.superset_id.clone(),
            sets,
        }
    }

    fn set_from_plan(plan: &PlannedSet) -> Set {
        Set::new(plan.weight.unwrap_or(Decimal::ZERO), plan.reps.unwrap_or(0))
            .with_rest(plan.rest.unwrap_or(DEFAULT_REST_SECONDS))
    }

    fn default_set() -> Set {
        Set::new(Decimal::ZERO, 0)
    }
}
