//! Template editing
//!
//! The editor keeps supersets pairwise: linking two neighbours first
//! dissolves any pair either of them was already in.

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{Result, SetLogError};
use crate::models::{generate_id, Equipment, Exercise, ExerciseBlueprint, ExerciseType, PlannedSet, Template};

/// Planned sets given to an exercise added to a template
pub const DEFAULT_PLANNED_SETS: usize = 3;

fn out_of_range(what: &str, index: usize, len: usize) -> SetLogError {
    SetLogError::Validation(format!("{} index {} out of range (len {})", what, index, len))
}

impl Template {
    /// Empty template; the name must not be blank
    pub fn new(name: &str, workout_type: Option<String>) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SetLogError::Validation("Template name must not be empty".to_string()));
        }

        Ok(Template {
            id: generate_id(),
            name: name.to_string(),
            workout_type: workout_type.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
            exercises: Vec::new(),
        })
    }

    /// Append a catalog exercise with three blank planned sets
    pub fn add_exercise(&mut self, exercise: &Exercise) -> usize {
        let mut blueprint = ExerciseBlueprint::from_exercise(exercise);
        blueprint.sets = (0..DEFAULT_PLANNED_SETS).map(|_| PlannedSet::new(None, None)).collect();
        self.exercises.push(blueprint);
        self.exercises.len() - 1
    }

    /// Remove a slot. A superset partner left alone is unlinked.
    pub fn remove_exercise(&mut self, index: usize) -> Result<ExerciseBlueprint> {
        if index >= self.exercises.len() {
            return Err(out_of_range("Exercise", index, self.exercises.len()));
        }

        let removed = self.exercises.remove(index);
        if let Some(superset_id) = removed.superset_id.as_deref() {
            self.dissolve_if_orphaned(superset_id);
        }
        Ok(removed)
    }

    /// Swap with the previous slot; no-op at the top
    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.exercises.len() {
            return false;
        }
        self.exercises.swap(index, index - 1);
        true
    }

    /// Swap with the next slot; no-op at the bottom
    pub fn move_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.exercises.len() {
            return false;
        }
        self.exercises.swap(index, index + 1);
        true
    }

    /// Append a planned set copying the previous one
    pub fn add_planned_set(&mut self, index: usize) -> Result<()> {
        let len = self.exercises.len();
        let blueprint = self
            .exercises
            .get_mut(index)
            .ok_or_else(|| out_of_range("Exercise", index, len))?;

        let next = blueprint
            .sets
            .last()
            .cloned()
            .unwrap_or_else(|| PlannedSet::new(None, None));
        blueprint.sets.push(next);
        Ok(())
    }

    pub fn remove_planned_set(&mut self, index: usize, set_index: usize) -> Result<()> {
        let len = self.exercises.len();
        let blueprint = self
            .exercises
            .get_mut(index)
            .ok_or_else(|| out_of_range("Exercise", index, len))?;

        if set_index >= blueprint.sets.len() {
            return Err(out_of_range("Set", set_index, blueprint.sets.len()));
        }
        blueprint.sets.remove(set_index);
        Ok(())
    }

    /// Replace one planned set's targets
    pub fn update_planned_set(&mut self, index: usize, set_index: usize, weight: Option<Decimal>, reps: Option<u32>, rest: Option<u32>) -> Result<()> {
        let len = self.exercises.len();
        let blueprint = self
            .exercises
            .get_mut(index)
            .ok_or_else(|| out_of_range("Exercise", index, len))?;
        let set_len = blueprint.sets.len();
        let set = blueprint
            .sets
            .get_mut(set_index)
            .ok_or_else(|| out_of_range("Set", set_index, set_len))?;

        *set = PlannedSet {
            weight: weight.map(|w| w.max(Decimal::ZERO)),
            reps,
            rest,
        };
        Ok(())
    }

    /// Choose the preselected equipment of a weighted slot
    pub fn set_equipment(&mut self, index: usize, equipment: Option<Equipment>) -> Result<()> {
        let len = self.exercises.len();
        let blueprint = self
            .exercises
            .get_mut(index)
            .ok_or_else(|| out_of_range("Exercise", index, len))?;

        if equipment.is_some() && blueprint.exercise_type == ExerciseType::Bodyweight {
            return Err(SetLogError::Validation(format!(
                "{} is a bodyweight exercise and takes no equipment",
                blueprint.name
            )));
        }
        blueprint.active_equipment = equipment;
        Ok(())
    }

    /// Link slot `index` with `index + 1`, or unlink them if already paired.
    /// Returns whether the two are linked afterwards. The last slot has no
    /// neighbour and is left unchanged.
    pub fn toggle_superset(&mut self, index: usize) -> bool {
        if index + 1 >= self.exercises.len() {
            return false;
        }

        let current = self.exercises[index].superset_id.clone();
        let next = self.exercises[index + 1].superset_id.clone();

        if current.is_some() && current == next {
            self.exercises[index].superset_id = None;
            self.exercises[index + 1].superset_id = None;
            debug!(template_id = %self.id, index, "Unlinked superset");
            return false;
        }

        for superset_id in [current, next].into_iter().flatten() {
            for blueprint in self.exercises.iter_mut() {
                if blueprint.superset_id.as_deref() == Some(superset_id.as_str()) {
                    blueprint.superset_id = None;
                }
            }
        }

        let superset_id = generate_id();
        self.exercises[index].superset_id = Some(superset_id.clone());
        self.exercises[index + 1].superset_id = Some(superset_id);
        debug!(template_id = %self.id, index, "Linked superset");
        true
    }

    fn dissolve_if_orphaned(&mut self, superset_id: &str) {
        let members: Vec<usize> = self
            .exercises
            .iter()
            .enumerate()
            .filter(|(_, b)| b.superset_id.as_deref() == Some(superset_id))
            .map(|(i, _)| i)
            .collect();

        if members.len() == 1 {
            self.exercises[members[0]].superset_id = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn template_with(n: usize) -> Template {
        let mut template = Template::new("Push", Some("Strength".to_string())).unwrap();
        for i in 0..n {
            template.add_exercise(&Exercise::new(format!("Ex {}", i), "chest", ExerciseType::Weighted));
        }
        template
    }

    fn superset_ids(template: &Template) -> Vec<Option<String>> {
        template.exercises.iter().map(|b| b.superset_id.clone()).collect()
    }

    #[test]
    fn test_new_requires_name() {
        assert!(Template::new("   ", None).is_err());
        let template = Template::new(" Legs ", Some(" ".to_string())).unwrap();
        assert_eq!(template.name, "Legs");
        assert!(template.workout_type.is_none());
    }

    #[test]
    fn test_add_exercise_creates_three_planned_sets() {
        let template = template_with(1);
        let sets = &template.exercises[0].sets;
        assert_eq!(sets.len(), DEFAULT_PLANNED_SETS);
        assert!(sets.iter().all(|s| s.weight.is_none() && s.reps.is_none() && s.rest == Some(90)));
        assert_eq!(template.exercises[0].category, "CHEST");
    }

    #[test]
    fn test_add_planned_set_copies_previous() {
        let mut template = template_with(1);
        template.update_planned_set(0, 2, Some(dec!(100)), Some(5), Some(120)).unwrap();
        template.add_planned_set(0).unwrap();

        let sets = &template.exercises[0].sets;
        assert_eq!(sets.len(), 4);
        assert_eq!(sets[3], PlannedSet { weight: Some(dec!(100)), reps: Some(5), rest: Some(120) });

        template.remove_planned_set(0, 0).unwrap();
        assert_eq!(template.exercises[0].sets.len(), 3);
        assert!(template.remove_planned_set(0, 9).is_err());
    }

    #[test]
    fn test_move() {
        let mut template = template_with(3);
        assert!(!template.move_up(0));
        assert!(!template.move_down(2));
        assert!(template.move_down(0));
        assert_eq!(template.exercises[0].name, "Ex 1");
        assert!(template.move_up(2));
        assert_eq!(template.exercises[1].name, "Ex 2");
    }

    #[test]
    fn test_toggle_superset_links_and_unlinks() {
        let mut template = template_with(3);
        assert!(template.toggle_superset(0));
        let ids = superset_ids(&template);
        assert!(ids[0].is_some());
        assert_eq!(ids[0], ids[1]);
        assert!(ids[2].is_none());

        assert!(!template.toggle_superset(0));
        assert!(superset_ids(&template).iter().all(Option::is_none));

        assert!(!template.toggle_superset(2));
    }

    #[test]
    fn test_toggle_superset_keeps_pairs() {
        let mut template = template_with(3);
        template.toggle_superset(0);
        template.toggle_superset(1);

        let ids = superset_ids(&template);
        assert!(ids[0].is_none());
        assert!(ids[1].is_some());
        assert_eq!(ids[1], ids[2]);
    }

    #[test]
    fn test_remove_exercise_unlinks_partner() {
        let mut template = template_with(3);
        template.toggle_superset(0);
        template.remove_exercise(1).unwrap();

        assert!(superset_ids(&template).iter().all(Option::is_none));
        assert!(template.remove_exercise(5).is_err());
    }

    #[test]
    fn test_bodyweight_rejects_equipment() {
        let mut template = template_with(0);
        template.add_exercise(&Exercise::new("Dips", "arms", ExerciseType::Bodyweight));
        assert!(template.set_equipment(0, Some(Equipment::Band)).is_err());
        assert!(template.set_equipment(0, None).is_ok());
    }
}
