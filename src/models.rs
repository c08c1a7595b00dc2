use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rest period applied when a set does not specify one
pub const DEFAULT_REST_SECONDS: u32 = 90;

/// Muscle group assigned when an exercise has no category
pub const DEFAULT_CATEGORY: &str = "GENERAL";

fn default_rest() -> u32 {
    DEFAULT_REST_SECONDS
}

/// Generate a fresh identifier for workouts, instances, sets and supersets
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// How an exercise is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseType {
    /// External load; volume is weight × reps
    #[default]
    Weighted,
    /// Body weight plus optional added load
    Bodyweight,
}

impl std::fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExerciseType::Weighted => write!(f, "weighted"),
            ExerciseType::Bodyweight => write!(f, "bodyweight"),
        }
    }
}

impl std::str::FromStr for ExerciseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weighted" | "wt" => Ok(ExerciseType::Weighted),
            "bodyweight" | "bw" => Ok(ExerciseType::Bodyweight),
            _ => Err(format!("Invalid exercise type: {}", s)),
        }
    }
}

/// Equipment a weighted exercise can be performed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Equipment {
    Bar,
    Dumbbell,
    Cable,
    Band,
    Machine,
}

impl Equipment {
    pub const ALL: [Equipment; 5] = [
        Equipment::Bar,
        Equipment::Dumbbell,
        Equipment::Cable,
        Equipment::Band,
        Equipment::Machine,
    ];
}

impl std::fmt::Display for Equipment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Equipment::Bar => write!(f, "BAR"),
            Equipment::Dumbbell => write!(f, "DUMBBELL"),
            Equipment::Cable => write!(f, "CABLE"),
            Equipment::Band => write!(f, "BAND"),
            Equipment::Machine => write!(f, "MACHINE"),
        }
    }
}

impl std::str::FromStr for Equipment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BAR" | "BARBELL" => Ok(Equipment::Bar),
            "DUMBBELL" => Ok(Equipment::Dumbbell),
            "CABLE" => Ok(Equipment::Cable),
            "BAND" => Ok(Equipment::Band),
            "MACHINE" => Ok(Equipment::Machine),
            _ => Err(format!("Invalid equipment: {}", s)),
        }
    }
}

/// Catalog exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    /// Unique identifier, immutable once created
    pub id: String,

    /// Display name
    pub name: String,

    /// Muscle group, always uppercase
    pub category: String,

    /// Free-form notes
    #[serde(default)]
    pub notes: String,

    /// Loading type, older records without one are weighted
    #[serde(default)]
    pub exercise_type: ExerciseType,

    /// Equipment the exercise can be done with (weighted only)
    #[serde(default)]
    pub equipment_options: Vec<Equipment>,

    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Exercise {
    /// Create a new catalog exercise with an uppercased category
    pub fn new(name: impl Into<String>, category: &str, exercise_type: ExerciseType) -> Self {
        let category = category.trim();
        Exercise {
            id: generate_id(),
            name: name.into(),
            category: if category.is_empty() {
                DEFAULT_CATEGORY.to_string()
            } else {
                category.to_uppercase()
            },
            notes: String::new(),
            exercise_type,
            equipment_options: Vec::new(),
            created_at: Some(Utc::now()),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Set equipment options, keeping first-seen order and dropping repeats.
    /// Bodyweight exercises never carry equipment.
    pub fn with_equipment(mut self, equipment: &[Equipment]) -> Self {
        self.equipment_options.clear();
        if self.exercise_type == ExerciseType::Weighted {
            for eq in equipment {
                if !self.equipment_options.contains(eq) {
                    self.equipment_options.push(*eq);
                }
            }
        }
        self
    }
}

/// Target values for one set in a template; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlannedSet {
    #[serde(default)]
    pub weight: Option<Decimal>,
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default)]
    pub rest: Option<u32>,
}

impl PlannedSet {
    pub fn new(weight: Option<Decimal>, reps: Option<u32>) -> Self {
        PlannedSet {
            weight,
            reps,
            rest: Some(DEFAULT_REST_SECONDS),
        }
    }
}

/// One exercise slot inside a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseBlueprint {
    /// Catalog exercise this slot was created from
    #[serde(default)]
    pub exercise_id: Option<String>,

    pub name: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub exercise_type: ExerciseType,

    #[serde(default)]
    pub equipment_options: Vec<Equipment>,

    /// Equipment preselected for this slot
    #[serde(default)]
    pub active_equipment: Option<Equipment>,

    /// Shared with exactly one sibling blueprint when linked
    #[serde(default)]
    pub superset_id: Option<String>,

    /// Default set plan
    #[serde(default)]
    pub sets: Vec<PlannedSet>,
}

impl ExerciseBlueprint {
    /// Blueprint copying the catalog exercise's attributes, with no planned sets
    pub fn from_exercise(exercise: &Exercise) -> Self {
        ExerciseBlueprint {
            exercise_id: Some(exercise.id.clone()),
            name: exercise.name.clone(),
            category: exercise.category.clone(),
            exercise_type: exercise.exercise_type,
            equipment_options: exercise.equipment_options.clone(),
            active_equipment: None,
            superset_id: None,
            sets: Vec::new(),
        }
    }
}

/// Reusable workout blueprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,

    pub name: String,

    /// Free-form label such as "Strength" or "Hypertrophy"
    #[serde(default)]
    pub workout_type: Option<String>,

    #[serde(default)]
    pub exercises: Vec<ExerciseBlueprint>,
}

/// One logged set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Set {
    pub id: String,

    /// Load (added load for bodyweight exercises), never negative
    #[serde(default)]
    pub weight: Decimal,

    #[serde(default)]
    pub reps: u32,

    #[serde(default)]
    pub completed: bool,

    /// Rest after the set in seconds
    #[serde(default = "default_rest")]
    pub rest: u32,
}

impl Set {
    /// Fresh, uncompleted set with the default rest period
    pub fn new(weight: Decimal, reps: u32) -> Self {
        Set {
            id: generate_id(),
            weight: weight.max(Decimal::ZERO),
            reps,
            completed: false,
            rest: DEFAULT_REST_SECONDS,
        }
    }

    pub fn with_rest(mut self, rest: u32) -> Self {
        self.rest = rest;
        self
    }

    /// Rest used for the countdown after completing this set
    pub fn effective_rest(&self) -> u32 {
        if self.rest == 0 {
            DEFAULT_REST_SECONDS
        } else {
            self.rest
        }
    }
}

/// Per-session copy of an exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseInstance {
    /// Unique within the owning workout, unrelated to the catalog id
    pub instance_id: String,

    #[serde(default)]
    pub exercise_id: Option<String>,

    pub name: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub exercise_type: ExerciseType,

    #[serde(default)]
    pub equipment_options: Vec<Equipment>,

    /// Equipment chosen for this session (weighted only)
    #[serde(default)]
    pub active_equipment: Option<Equipment>,

    #[serde(default)]
    pub superset_id: Option<String>,

    #[serde(default)]
    pub sets: Vec<Set>,
}

impl ExerciseInstance {
    pub fn is_bodyweight(&self) -> bool {
        self.exercise_type == ExerciseType::Bodyweight
    }

    pub fn find_set(&self, set_id: &str) -> Option<&Set> {
        self.sets.iter().find(|s| s.id == set_id)
    }

    pub fn completed_sets(&self) -> usize {
        self.sets.iter().filter(|s| s.completed).count()
    }
}

/// A live or finished training session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,

    pub start_time: DateTime<Utc>,

    /// Set when the workout is finished
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,

    /// Whole minutes between start and end, set when finished
    #[serde(default)]
    pub duration_minutes: Option<u32>,

    #[serde(default)]
    pub template_id: Option<String>,

    #[serde(default)]
    pub template_name: Option<String>,

    #[serde(default)]
    pub workout_type: Option<String>,

    #[serde(default)]
    pub exercises: Vec<ExerciseInstance>,
}

/// A finished workout as stored in history
pub type WorkoutLog = Workout;

impl Workout {
    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }

    pub fn find_exercise(&self, instance_id: &str) -> Option<&ExerciseInstance> {
        self.exercises.iter().find(|e| e.instance_id == instance_id)
    }

    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }
}

/// Partial edit of a catalog exercise; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExerciseEdit {
    pub name: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub exercise_type: Option<ExerciseType>,
    pub equipment: Option<Vec<Equipment>>,
}

impl ExerciseEdit {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Merge into a copy of `exercise`, keeping its id and creation time.
    ///
    /// Blank names are ignored. Categories are normalized like
    /// [`Exercise::new`] and switching to bodyweight drops equipment.
    pub fn apply_to(&self, exercise: &Exercise) -> Exercise {
        let mut edited = exercise.clone();
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            edited.name = name.to_string();
        }
        if let Some(category) = &self.category {
            let category = category.trim();
            edited.category = if category.is_empty() {
                DEFAULT_CATEGORY.to_string()
            } else {
                category.to_uppercase()
            };
        }
        if let Some(notes) = &self.notes {
            edited.notes = notes.clone();
        }
        if let Some(exercise_type) = self.exercise_type {
            edited.exercise_type = exercise_type;
        }
        let equipment = self.equipment.clone().unwrap_or_else(|| edited.equipment_options.clone());
        edited.with_equipment(&equipment)
    }
}

/// Partial set update; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetUpdate {
    pub weight: Option<Decimal>,
    pub reps: Option<u32>,
    pub completed: Option<bool>,
    pub rest: Option<u32>,
}

impl SetUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn weight(mut self, weight: Decimal) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn reps(mut self, reps: u32) -> Self {
        self.reps = Some(reps);
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn rest(mut self, rest: u32) -> Self {
        self.rest = Some(rest);
        self
    }

    /// Weight from raw text input, coerced like the set editor does
    pub fn weight_text(self, input: &str) -> Self {
        self.weight(parse_weight(input))
    }

    pub fn reps_text(self, input: &str) -> Self {
        self.reps(parse_reps(input))
    }

    pub fn rest_text(self, input: &str) -> Self {
        self.rest(parse_rest(input))
    }

    pub fn is_empty(&self) -> bool {
        self.weight.is_none() && self.reps.is_none() && self.completed.is_none() && self.rest.is_none()
    }

    /// Merge into a copy of `set`
    pub fn apply_to(&self, set: &Set) -> Set {
        Set {
            id: set.id.clone(),
            weight: self.weight.map_or(set.weight, |w| w.max(Decimal::ZERO)),
            reps: self.reps.unwrap_or(set.reps),
            completed: self.completed.unwrap_or(set.completed),
            rest: self.rest.unwrap_or(set.rest),
        }
    }
}

/// Parse a weight entry; anything unparseable or negative becomes 0
pub fn parse_weight(input: &str) -> Decimal {
    Decimal::from_str(input.trim())
        .ok()
        .filter(|w| !w.is_sign_negative())
        .unwrap_or(Decimal::ZERO)
}

/// Parse a rep count; fractions are truncated, invalid input becomes 0
pub fn parse_reps(input: &str) -> u32 {
    let trimmed = input.trim();
    if let Ok(reps) = trimmed.parse::<u32>() {
        return reps;
    }
    Decimal::from_str(trimmed)
        .ok()
        .filter(|r| !r.is_sign_negative())
        .and_then(|r| r.trunc().to_u32())
        .unwrap_or(0)
}

/// Parse a rest period in seconds; invalid input falls back to the default
pub fn parse_rest(input: &str) -> u32 {
    let trimmed = input.trim();
    if let Ok(rest) = trimmed.parse::<u32>() {
        return rest;
    }
    Decimal::from_str(trimmed)
        .ok()
        .filter(|r| !r.is_sign_negative())
        .and_then(|r| r.trunc().to_u32())
        .unwrap_or(DEFAULT_REST_SECONDS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(parse_weight("135.5"), dec!(135.5));
        assert_eq!(parse_weight(" 60 "), dec!(60));
        assert_eq!(parse_weight("abc"), Decimal::ZERO);
        assert_eq!(parse_weight("-20"), Decimal::ZERO);
        assert_eq!(parse_weight(""), Decimal::ZERO);

        assert_eq!(parse_reps("8"), 8);
        assert_eq!(parse_reps("8.7"), 8);
        assert_eq!(parse_reps("ten"), 0);
        assert_eq!(parse_reps("-3"), 0);

        assert_eq!(parse_rest("120"), 120);
        assert_eq!(parse_rest("0"), 0);
        assert_eq!(parse_rest("soon"), DEFAULT_REST_SECONDS);
    }

    #[test]
    fn test_set_update_merge() {
        let set = Set::new(dec!(100), 5);
        let updated = SetUpdate::new().reps(6).completed(true).apply_to(&set);

        assert_eq!(updated.id, set.id);
        assert_eq!(updated.weight, dec!(100));
        assert_eq!(updated.reps, 6);
        assert!(updated.completed);
        assert_eq!(updated.rest, DEFAULT_REST_SECONDS);

        let clamped = SetUpdate::new().weight(dec!(-5)).apply_to(&set);
        assert_eq!(clamped.weight, Decimal::ZERO);
    }

    #[test]
    fn test_effective_rest() {
        let set = Set::new(dec!(0), 0).with_rest(0);
        assert_eq!(set.effective_rest(), DEFAULT_REST_SECONDS);
        assert_eq!(set.with_rest(45).effective_rest(), 45);
    }

    #[test]
    fn test_exercise_new_normalizes_category_and_equipment() {
        let ex = Exercise::new("Bench Press", "chest", ExerciseType::Weighted)
            .with_equipment(&[Equipment::Bar, Equipment::Dumbbell, Equipment::Bar]);
        assert_eq!(ex.category, "CHEST");
        assert_eq!(ex.equipment_options, vec![Equipment::Bar, Equipment::Dumbbell]);

        let bw = Exercise::new("Pull-ups", "", ExerciseType::Bodyweight)
            .with_equipment(&[Equipment::Band]);
        assert_eq!(bw.category, DEFAULT_CATEGORY);
        assert!(bw.equipment_options.is_empty());
    }

    #[test]
    fn test_exercise_edit_merge() {
        let bench = Exercise::new("Bench", "chest", ExerciseType::Weighted).with_equipment(&[Equipment::Bar]);

        let renamed = ExerciseEdit {
            name: Some("  Flat Bench ".to_string()),
            category: Some("push".to_string()),
            ..Default::default()
        }
        .apply_to(&bench);
        assert_eq!(renamed.id, bench.id);
        assert_eq!(renamed.name, "Flat Bench");
        assert_eq!(renamed.category, "PUSH");
        assert_eq!(renamed.equipment_options, vec![Equipment::Bar]);
        assert_eq!(renamed.created_at, bench.created_at);

        let blank = ExerciseEdit {
            name: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.apply_to(&bench).name, "Bench");

        let bodyweight = ExerciseEdit {
            exercise_type: Some(ExerciseType::Bodyweight),
            ..Default::default()
        }
        .apply_to(&bench);
        assert!(bodyweight.equipment_options.is_empty());
        assert!(ExerciseEdit::default().is_empty());
    }

    #[test]
    fn test_legacy_exercise_defaults() {
        let json = r#"{"id":"1","name":"Squat","category":"LEGS"}"#;
        let ex: Exercise = serde_json::from_str(json).unwrap();
        assert_eq!(ex.exercise_type, ExerciseType::Weighted);
        assert!(ex.equipment_options.is_empty());
        assert_eq!(ex.notes, "");
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("BW".parse::<ExerciseType>().unwrap(), ExerciseType::Bodyweight);
        assert_eq!("cable".parse::<Equipment>().unwrap(), Equipment::Cable);
        assert!("kettlebell".parse::<Equipment>().is_err());
        assert_eq!(serde_json::to_string(&Equipment::Machine).unwrap(), "\"MACHINE\"");
    }
}
