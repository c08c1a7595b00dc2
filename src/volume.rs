use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{ExerciseInstance, ExerciseType, Set, Workout};

/// Which sets count toward volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumePolicy {
    /// Every logged set, completed or not (historical behavior)
    #[default]
    AllSets,
    /// Only sets marked completed
    CompletedOnly,
}

impl VolumePolicy {
    fn counts(&self, set: &Set) -> bool {
        match self {
            VolumePolicy::AllSets => true,
            VolumePolicy::CompletedOnly => set.completed,
        }
    }
}

/// Training volume engine
///
/// Weighted sets contribute weight × reps. Bodyweight sets contribute
/// (bodyweight + added weight) × reps, or just reps when neither is known.
/// Totals saturate at `Decimal::MAX` rather than overflow.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VolumeCalculator {
    user_bodyweight: Option<Decimal>,
    policy: VolumePolicy,
}

impl VolumeCalculator {
    pub fn new(user_bodyweight: Option<Decimal>) -> Self {
        VolumeCalculator {
            user_bodyweight,
            policy: VolumePolicy::AllSets,
        }
    }

    pub fn with_policy(mut self, policy: VolumePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> VolumePolicy {
        self.policy
    }

    /// Volume of one set
    pub fn volume_of_set(set: &Set, exercise_type: ExerciseType, user_bodyweight: Option<Decimal>) -> Decimal {
        let reps = Decimal::from(set.reps);
        let weight = set.weight.max(Decimal::ZERO);

        match exercise_type {
            ExerciseType::Weighted => saturating_mul(weight, reps),
            ExerciseType::Bodyweight => {
                let bodyweight = user_bodyweight
                    .filter(|bw| *bw > Decimal::ZERO)
                    .unwrap_or(Decimal::ZERO);
                if bodyweight.is_zero() && weight.is_zero() {
                    reps
                } else {
                    saturating_mul(saturating_add(bodyweight, weight), reps)
                }
            }
        }
    }

    /// Volume of every set of an exercise, completed or not
    pub fn volume_of_exercise(exercise: &ExerciseInstance, user_bodyweight: Option<Decimal>) -> Decimal {
        Self::new(user_bodyweight).exercise_volume(exercise)
    }

    /// Sum of exercise volumes across the workout
    pub fn volume_of_workout(workout: &Workout, user_bodyweight: Option<Decimal>) -> Decimal {
        Self::new(user_bodyweight).workout_volume(workout)
    }

    /// Exercise volume under this calculator's policy
    pub fn exercise_volume(&self, exercise: &ExerciseInstance) -> Decimal {
        exercise
            .sets
            .iter()
            .filter(|set| self.policy.counts(set))
            .map(|set| Self::volume_of_set(set, exercise.exercise_type, self.user_bodyweight))
            .fold(Decimal::ZERO, saturating_add)
    }

    /// Workout volume under this calculator's policy
    pub fn workout_volume(&self, workout: &Workout) -> Decimal {
        workout
            .exercises
            .iter()
            .map(|exercise| self.exercise_volume(exercise))
            .fold(Decimal::ZERO, saturating_add)
    }
}

/// Addition clamped to `Decimal::MAX`; volumes are never negative
pub(crate) fn saturating_add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or(Decimal::MAX)
}

fn saturating_mul(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b).unwrap_or(Decimal::MAX)
}
