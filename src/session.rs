//! The active-workout slot
//!
//! [`WorkoutSession`] owns at most one live workout. Every mutation replaces
//! the slot with the workout returned by [`crate::mutations`]; nothing is
//! persisted until the workout is finished.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError, SetLogError};
use crate::factory::{TargetOverride, WorkoutFactory};
use crate::grouping::{group_exercises, ExerciseGroup};
use crate::models::{Exercise, SetUpdate, Template, Workout};
use crate::mutations::{self, RestTimer};
use crate::storage::CatalogStore;

/// Behavior switches for a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Log and ignore mutations that reference unknown ids instead of failing
    pub lenient_lookups: bool,
}

/// Live session bound to a catalog store
pub struct WorkoutSession<S: CatalogStore> {
    store: S,
    active: Option<Workout>,
    options: SessionOptions,
}

impl<S: CatalogStore> WorkoutSession<S> {
    pub fn new(store: S) -> Self {
        Self::with_options(store, SessionOptions::default())
    }

    pub fn with_options(store: S, options: SessionOptions) -> Self {
        WorkoutSession {
            store,
            active: None,
            options,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn active(&self) -> Option<&Workout> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Groups of the active workout for display
    pub fn groups(&self) -> Vec<ExerciseGroup<'_>> {
        self.active
            .as_ref()
            .map(|w| group_exercises(&w.exercises))
            .unwrap_or_default()
    }

    /// Make `workout` the active one
    pub fn start(&mut self, workout: Workout) -> Result<&Workout> {
        if let Some(current) = &self.active {
            return Err(SessionError::ActiveWorkoutAlreadyExists {
                id: current.id.clone(),
            }
            .into());
        }

        info!(
            workout_id = %workout.id,
            template = workout.template_name.as_deref().unwrap_or("freestyle"),
            exercises = workout.exercises.len(),
            "Workout started"
        );
        let active: &Workout = self.active.insert(workout);
        Ok(active)
    }

    /// Instantiate a template (or an empty workout) and start it
    pub fn start_from_template(&mut self, template: Option<&Template>) -> Result<&Workout> {
        self.start(WorkoutFactory::create_from_template(template))
    }

    /// Instantiate a template with set targets applied and start it
    pub fn start_configured(&mut self, template: Option<&Template>, overrides: &[TargetOverride]) -> Result<&Workout> {
        let workout = WorkoutFactory::create_from_template(template);
        self.start(WorkoutFactory::apply_config(&workout, overrides))
    }

    pub fn add_set(&mut self, instance_id: &str) -> Result<()> {
        self.replace("add_set", |w| mutations::add_set(w, instance_id))
    }

    pub fn update_set(&mut self, instance_id: &str, set_id: &str, update: &SetUpdate) -> Result<()> {
        self.replace("update_set", |w| mutations::update_set(w, instance_id, set_id, update))
    }

    pub fn delete_set(&mut self, instance_id: &str, set_id: &str) -> Result<()> {
        self.replace("delete_set", |w| mutations::delete_set(w, instance_id, set_id))
    }

    /// Flip a set's completion; returns the rest timer to start, if any
    pub fn toggle_set(&mut self, instance_id: &str, set_id: &str) -> Result<Option<RestTimer>> {
        let current = self.active.as_ref().ok_or(SessionError::NoActiveWorkout)?;
        match mutations::toggle_set(current, instance_id, set_id) {
            Ok(outcome) => {
                debug!(set_id, completed = outcome.completed, "Toggled set");
                self.active = Some(outcome.workout);
                Ok(outcome.rest_timer)
            }
            Err(err) => self.lenient("toggle_set", err).map(|()| None),
        }
    }

    /// Link exercises into a new superset; returns its id
    pub fn create_superset(&mut self, instance_ids: &[&str]) -> Result<Option<String>> {
        let current = self.active.as_ref().ok_or(SessionError::NoActiveWorkout)?;
        match mutations::create_superset(current, instance_ids) {
            Ok((workout, superset_id)) => {
                debug!(%superset_id, members = instance_ids.len(), "Created superset");
                self.active = Some(workout);
                Ok(Some(superset_id))
            }
            Err(err) => self.lenient("create_superset", err).map(|()| None),
        }
    }

    /// Append a catalog exercise; returns the new instance id
    pub fn add_exercise(&mut self, exercise: &Exercise, superset_id: Option<String>) -> Result<String> {
        let current = self.active.as_ref().ok_or(SessionError::NoActiveWorkout)?;
        let (workout, instance_id) = mutations::add_exercise(current, exercise, superset_id);
        self.active = Some(workout);
        Ok(instance_id)
    }

    /// Finish now; see [`WorkoutSession::finish_workout_at`]
    pub fn finish_workout(&mut self) -> Result<Option<Workout>> {
        self.finish_workout_at(Utc::now())
    }

    /// Timestamp, persist and clear the active workout.
    ///
    /// Returns `Ok(None)` when nothing is active. If the store rejects the
    /// log the workout stays active so the caller can retry.
    pub fn finish_workout_at(&mut self, now: DateTime<Utc>) -> Result<Option<Workout>> {
        let Some(current) = self.active.as_ref() else {
            return Ok(None);
        };

        let mut finished = current.clone();
        finished.end_time = Some(now);
        finished.duration_minutes = Some(duration_minutes(finished.start_time, now));

        self.store.save_log(&finished)?;
        self.active = None;

        info!(
            workout_id = %finished.id,
            duration_minutes = finished.duration_minutes.unwrap_or(0),
            sets = finished.total_sets(),
            "Workout finished"
        );
        Ok(Some(finished))
    }

    /// Discard the active workout without saving it
    pub fn cancel_workout(&mut self) -> Option<Workout> {
        let discarded = self.active.take();
        if let Some(workout) = &discarded {
            info!(workout_id = %workout.id, "Workout cancelled");
        }
        discarded
    }

    fn replace<F>(&mut self, operation: &str, mutate: F) -> Result<()>
    where
        F: FnOnce(&Workout) -> std::result::Result<Workout, SessionError>,
    {
        let current = self.active.as_ref().ok_or(SessionError::NoActiveWorkout)?;
        match mutate(current) {
            Ok(next) => {
                self.active = Some(next);
                Ok(())
            }
            Err(err) => self.lenient(operation, err),
        }
    }

    fn lenient(&self, operation: &str, err: SessionError) -> Result<()> {
        if self.options.lenient_lookups && err.is_not_found() {
            warn!(operation, error = %err, "Ignoring mutation with unknown id");
            return Ok(());
        }
        Err(SetLogError::Session(err))
    }
}

/// Whole minutes between start and end, rounded to nearest
fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let seconds = (end - start).num_seconds().max(0);
    u32::try_from((seconds + 30) / 60).unwrap_or(u32::MAX)
}
