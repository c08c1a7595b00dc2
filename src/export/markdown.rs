//! Markdown note rendering
//!
//! Output is a YAML frontmatter block followed by one section per exercise
//! group. Frontmatter order is fixed: date, type, duration, per-exercise
//! volumes, tags.

use std::fmt::{self, Write};

use rust_decimal::Decimal;

use crate::grouping::{group_exercises, ExerciseGroup};
use crate::models::{ExerciseInstance, Workout};
use crate::settings::Settings;
use crate::volume::saturating_add;

/// Renders finished workouts as Markdown notes
pub struct MarkdownGenerator;

impl MarkdownGenerator {
    /// Render `workout` using the key names, tags and bodyweight in `settings`
    pub fn generate(workout: &Workout, settings: &Settings) -> String {
        let mut markdown = String::new();
        // fmt::Write for String never fails
        let _ = Self::write_to(&mut markdown, workout, settings);
        markdown
    }

    /// Render into any formatter sink
    pub fn write_to<W: Write>(out: &mut W, workout: &Workout, settings: &Settings) -> fmt::Result {
        Self::write_frontmatter(out, workout, settings)?;

        let start = settings.local_time(workout.start_time);
        let title = match workout.template_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => start.format("%A, %b %-d").to_string(),
        };
        writeln!(out, "# {} - {}", title, start.format("%Y-%m-%d"))?;
        writeln!(out)?;

        let mut superset_number = 0;
        for group in group_exercises(&workout.exercises) {
            match group {
                ExerciseGroup::Superset { exercises, .. } => {
                    superset_number += 1;
                    writeln!(out, "### Superset {}", superset_number)?;
                    for exercise in exercises {
                        Self::write_exercise(out, exercise)?;
                    }
                }
                ExerciseGroup::Single(exercise) => Self::write_exercise(out, exercise)?,
            }
            writeln!(out)?;
        }

        Ok(())
    }

    fn write_frontmatter<W: Write>(out: &mut W, workout: &Workout, settings: &Settings) -> fmt::Result {
        let keys = &settings.yaml_mapping;
        let start = settings.local_time(workout.start_time);

        writeln!(out, "---")?;
        writeln!(out, "{}: {}", keys.date, start.format("%Y-%m-%d %H:%M"))?;
        if let Some(workout_type) = workout.workout_type.as_deref().filter(|t| !t.is_empty()) {
            writeln!(out, "{}: \"[[{}]]\"", keys.workout_type, escape_quoted(workout_type))?;
        }
        writeln!(out, "{}: {}", keys.duration, workout.duration_minutes.unwrap_or(0))?;

        for (key, volume) in Self::exercise_volumes(workout, settings) {
            writeln!(out, "{}_volume: {}", key, format_decimal(volume))?;
        }

        let tags: Vec<&str> = settings.tags.iter().map(|t| t.trim_start_matches('#')).collect();
        writeln!(out, "{}: {}", keys.tags, tags.join(", "))?;
        writeln!(out, "---")?;
        writeln!(out)
    }

    /// Nonzero volumes keyed by sanitized exercise name, in first-seen order.
    /// Names that sanitize to the same key are summed.
    fn exercise_volumes(workout: &Workout, settings: &Settings) -> Vec<(String, Decimal)> {
        let calculator = settings.volume_calculator();
        let mut volumes: Vec<(String, Decimal)> = Vec::new();

        for exercise in &workout.exercises {
            let volume = calculator.exercise_volume(exercise);
            if volume.is_zero() {
                continue;
            }
            let key = sanitize_key(&exercise.name);
            match volumes.iter_mut().find(|(existing, _)| *existing == key) {
                Some((_, total)) => *total = saturating_add(*total, volume),
                None => volumes.push((key, volume)),
            }
        }

        volumes
    }

    fn write_exercise<W: Write>(out: &mut W, exercise: &ExerciseInstance) -> fmt::Result {
        writeln!(out, "{}", exercise_heading(exercise))?;
        writeln!(out, "| Set | Weight | Reps |")?;
        writeln!(out, "| --- | --- | --- |")?;

        for (i, set) in exercise.sets.iter().enumerate() {
            let weight = if exercise.is_bodyweight() {
                if set.weight.is_zero() {
                    "BW".to_string()
                } else {
                    format!("+{}", format_decimal(set.weight))
                }
            } else {
                format_decimal(set.weight)
            };
            writeln!(out, "| {} | {} | {} |", i + 1, weight, set.reps)?;
        }

        writeln!(out)
    }
}

/// `#### <name>[ [BW]][ (<equipment>)]`
fn exercise_heading(exercise: &ExerciseInstance) -> String {
    let name = if exercise.name.is_empty() {
        "Unknown Exercise"
    } else {
        exercise.name.as_str()
    };

    let mut heading = format!("#### {}", name);
    if exercise.is_bodyweight() {
        heading.push_str(" [BW]");
    }
    if let Some(equipment) = exercise.active_equipment {
        heading.push_str(&format!(" ({})", equipment));
    }
    heading
}

/// Replace every character outside `[A-Za-z0-9]` with `_`
pub fn sanitize_key(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Decimal without trailing zeros
fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Escape for a double-quoted YAML scalar
fn escape_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Equipment, ExerciseType, Set};
    use chrono::{DateTime, Duration, Utc};
    use rust_decimal_macros::dec;

    fn instance(name: &str, exercise_type: ExerciseType, superset: Option<&str>, sets: &[(Decimal, u32)]) -> ExerciseInstance {
        ExerciseInstance {
            instance_id: crate::models::generate_id(),
            exercise_id: None,
            name: name.to_string(),
            category: "GENERAL".to_string(),
            exercise_type,
            equipment_options: Vec::new(),
            active_equipment: None,
            superset_id: superset.map(str::to_string),
            sets: sets.iter().map(|(w, r)| Set::new(*w, *r)).collect(),
        }
    }

    fn workout(exercises: Vec<ExerciseInstance>) -> Workout {
        let start = "2024-01-25T14:30:00Z".parse::<DateTime<Utc>>().unwrap();
        Workout {
            id: "w1".to_string(),
            start_time: start,
            end_time: Some(start + Duration::minutes(45)),
            duration_minutes: Some(45),
            template_id: Some("t1".to_string()),
            template_name: Some("Upper Body".to_string()),
            workout_type: Some("Strength".to_string()),
            exercises,
        }
    }

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.tags = vec!["#workout".to_string()];
        settings.user_bodyweight = Some(dec!(180));
        settings
    }

    fn upper_body() -> Workout {
        workout(vec![
            instance("Bench Press", ExerciseType::Weighted, None, &[(dec!(135), 10), (dec!(135), 8)]),
            instance("Pull-ups", ExerciseType::Bodyweight, None, &[(dec!(0), 8), (dec!(0), 6)]),
        ])
    }

    #[test]
    fn test_frontmatter_fields() {
        let md = MarkdownGenerator::generate(&upper_body(), &settings());

        assert!(md.starts_with("---\n"));
        assert!(md.contains("date: 2024-01-25 14:30\n"));
        assert!(md.contains("workout_type: \"[[Strength]]\"\n"));
        assert!(md.contains("duration: 45\n"));
        assert!(md.contains("Bench_Press_volume: 2430\n"));
        assert!(md.contains("Pull_ups_volume: 2520\n"));
        assert!(md.contains("tags: workout\n"));
        assert!(!md.lines().any(|line| line.starts_with("volume:")));
    }

    #[test]
    fn test_full_document() {
        let md = MarkdownGenerator::generate(&upper_body(), &settings());
        let expected = "---\n\
date: 2024-01-25 14:30\n\
workout_type: \"[[Strength]]\"\n\
duration: 45\n\
Bench_Press_volume: 2430\n\
Pull_ups_volume: 2520\n\
tags: workout\n\
---\n\
\n\
# Upper Body - 2024-01-25\n\
\n\
#### Bench Press\n\
| Set | Weight | Reps |\n\
| --- | --- | --- |\n\
| 1 | 135 | 10 |\n\
| 2 | 135 | 8 |\n\
\n\
\n\
#### Pull-ups [BW]\n\
| Set | Weight | Reps |\n\
| --- | --- | --- |\n\
| 1 | BW | 8 |\n\
| 2 | BW | 6 |\n\
\n\
\n";
        assert_eq!(md, expected);
    }

    #[test]
    fn test_custom_keys_and_missing_type() {
        let mut w = upper_body();
        w.workout_type = None;
        w.duration_minutes = None;
        let mut s = settings();
        s.yaml_mapping.date = "when".to_string();
        s.yaml_mapping.duration = "minutes".to_string();
        s.tags = vec!["#workout/gym".to_string(), "#push".to_string()];

        let md = MarkdownGenerator::generate(&w, &s);
        assert!(md.contains("when: 2024-01-25 14:30\n"));
        assert!(md.contains("minutes: 0\n"));
        assert!(!md.contains("[["));
        assert!(md.contains("tags: workout/gym, push\n"));
    }

    #[test]
    fn test_duplicate_names_accumulate_and_zero_volume_is_skipped() {
        let w = workout(vec![
            instance("Bench Press", ExerciseType::Weighted, None, &[(dec!(100), 5)]),
            instance("Plank", ExerciseType::Weighted, None, &[(dec!(0), 0)]),
            instance("Bench-Press", ExerciseType::Weighted, None, &[(dec!(50.5), 2)]),
        ]);
        let md = MarkdownGenerator::generate(&w, &settings());

        assert!(md.contains("Bench_Press_volume: 601\n"));
        assert_eq!(md.matches("_volume:").count(), 1);
        assert!(!md.contains("Plank_volume"));
    }

    #[test]
    fn test_workout_type_is_escaped() {
        let mut w = upper_body();
        w.workout_type = Some(r#"Push "Heavy" \ Day"#.to_string());
        let md = MarkdownGenerator::generate(&w, &settings());
        assert!(md.contains(r#"workout_type: "[[Push \"Heavy\" \\ Day]]""#));
    }

    #[test]
    fn test_overflowing_volume_saturates() {
        let w = workout(vec![
            instance("Sled", ExerciseType::Weighted, None, &[(Decimal::MAX, 2)]),
            instance("Sled", ExerciseType::Weighted, None, &[(Decimal::MAX, 1)]),
        ]);
        let md = MarkdownGenerator::generate(&w, &settings());
        assert!(md.contains(&format!("Sled_volume: {}\n", Decimal::MAX)));
    }

    #[test]
    fn test_supersets_numbered_among_supersets_only() {
        let w = workout(vec![
            instance("Warmup", ExerciseType::Weighted, None, &[(dec!(20), 10)]),
            instance("Curl", ExerciseType::Weighted, Some("a"), &[(dec!(30), 10)]),
            instance("Dips", ExerciseType::Bodyweight, Some("a"), &[(dec!(25), 8)]),
            instance("Squat", ExerciseType::Weighted, Some("b"), &[(dec!(225), 5)]),
            instance("Lunge", ExerciseType::Weighted, Some("b"), &[(dec!(50), 12)]),
        ]);
        let md = MarkdownGenerator::generate(&w, &settings());

        assert!(md.contains("### Superset 1\n#### Curl\n"));
        assert!(md.contains("### Superset 2\n#### Squat\n"));
        assert!(!md.contains("### Superset 3"));
        assert!(md.contains("| 1 | +25 | 8 |"));
    }

    #[test]
    fn test_heading_fallback_and_annotations() {
        let mut bench = instance("", ExerciseType::Weighted, None, &[(dec!(62.50), 5)]);
        bench.active_equipment = Some(Equipment::Dumbbell);
        let mut w = workout(vec![bench]);
        w.template_name = None;

        let md = MarkdownGenerator::generate(&w, &settings());
        assert!(md.contains("# Thursday, Jan 25 - 2024-01-25\n"));
        assert!(md.contains("#### Unknown Exercise (DUMBBELL)\n"));
        assert!(md.contains("| 1 | 62.5 | 5 |"));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let w = upper_body();
        assert_eq!(MarkdownGenerator::generate(&w, &settings()), MarkdownGenerator::generate(&w, &settings()));
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("Pull-ups"), "Pull_ups");
        assert_eq!(sanitize_key("DB Row (1-arm)"), "DB_Row__1_arm_");
    }
}
