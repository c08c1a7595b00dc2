//! Integration tests for the template → session → log workflow

use chrono::{DateTime, Duration, Utc};
use rust_decimal_macros::dec;
use setlog::{
    CatalogStore, Equipment, ExerciseType, KvCatalog, MemoryCatalog, SessionError, SetLogError, SetUpdate,
    TargetOverride, Template, WorkoutSession,
};
use setlog::storage::SqliteBackend;
use tempfile::TempDir;

fn push_day(store: &mut impl CatalogStore) -> Template {
    let bench = store
        .add_exercise("Bench Press", "chest", ExerciseType::Weighted, &[Equipment::Bar, Equipment::Dumbbell])
        .unwrap();
    let fly = store.add_exercise("Cable Fly", "chest", ExerciseType::Weighted, &[Equipment::Cable]).unwrap();
    let dips = store.add_exercise("Dips", "arms", ExerciseType::Bodyweight, &[]).unwrap();

    let mut template = Template::new("Push Day", Some("Hypertrophy".to_string())).unwrap();
    template.add_exercise(&bench);
    template.add_exercise(&fly);
    template.add_exercise(&dips);
    template.set_equipment(0, Some(Equipment::Bar)).unwrap();
    template.update_planned_set(0, 0, Some(dec!(135)), Some(10), Some(120)).unwrap();
    assert!(template.toggle_superset(1));

    store.save_template(&template).unwrap();
    template
}

#[test]
fn test_template_to_finished_log() {
    let mut store = MemoryCatalog::in_memory();
    let template = push_day(&mut store);
    let stored = store.find_template(&template.id).unwrap();

    let mut session = WorkoutSession::new(store);
    let workout = session.start_from_template(Some(&stored)).unwrap().clone();

    assert_eq!(workout.exercises.len(), 3);
    assert!(workout.exercises.iter().all(|e| e.sets.len() == 3));
    assert_eq!(workout.exercises[0].sets[0].weight, dec!(135));
    assert_eq!(workout.exercises[0].sets[0].rest, 120);
    assert_eq!(workout.exercises[0].active_equipment, Some(Equipment::Bar));
    assert!(workout.exercises[1].superset_id.is_some());
    assert_eq!(workout.exercises[1].superset_id, workout.exercises[2].superset_id);

    let groups = session.groups();
    assert_eq!(groups.len(), 2);
    assert!(groups[1].is_superset());

    let bench = &workout.exercises[0];
    let rest = session.toggle_set(&bench.instance_id, &bench.sets[0].id).unwrap();
    assert_eq!(rest.map(|t| t.seconds), Some(120));

    let finished = session
        .finish_workout_at(workout.start_time + Duration::minutes(50))
        .unwrap()
        .unwrap();
    assert_eq!(finished.duration_minutes, Some(50));
    assert_eq!(finished.template_name.as_deref(), Some("Push Day"));

    let store = session.into_store();
    let logs = store.get_logs().unwrap();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].exercises[0].sets[0].completed);
    assert!(!logs[0].exercises[0].sets[1].completed);
}

#[test]
fn test_configured_start_and_mid_session_superset() {
    let mut store = MemoryCatalog::in_memory();
    let template = push_day(&mut store);
    let curl = store.add_exercise("Curl", "arms", ExerciseType::Weighted, &[]).unwrap();

    let mut session = WorkoutSession::new(store);
    let overrides = [TargetOverride { exercise_index: 2, target_sets: 4, target_reps: 12 }];
    session.start_configured(Some(&template), &overrides).unwrap();

    let dips = session.active().unwrap().exercises[2].clone();
    assert_eq!(dips.sets.len(), 4);
    assert!(dips.sets.iter().all(|s| s.reps == 12));

    let curl_id = session.add_exercise(&curl, None).unwrap();
    let bench_id = session.active().unwrap().exercises[0].instance_id.clone();
    let superset = session.create_superset(&[bench_id.as_str(), curl_id.as_str()]).unwrap();
    assert!(superset.is_some());

    let workout = session.active().unwrap();
    assert_eq!(workout.exercises.len(), 4);
    assert_eq!(workout.exercises[0].superset_id, workout.exercises[3].superset_id);
    assert_eq!(session.groups().len(), 2);
}

#[test]
fn test_failed_mutation_leaves_workout_untouched() {
    let mut session = WorkoutSession::new(MemoryCatalog::in_memory());
    session.start_from_template(None).unwrap();
    let before = session.active().cloned();

    let err = session
        .update_set("missing", "missing", &SetUpdate::new().reps(5))
        .unwrap_err();
    assert!(matches!(err, SetLogError::Session(SessionError::NotFound { .. })));
    assert_eq!(session.active().cloned(), before);
}

#[test]
fn test_logs_survive_sqlite_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("setlog.db");
    let start = "2024-03-02T09:00:00Z".parse::<DateTime<Utc>>().unwrap();

    let log_id = {
        let mut store = KvCatalog::new(SqliteBackend::new(&db_path).unwrap());
        let template = push_day(&mut store);
        let mut session = WorkoutSession::new(store);
        let mut workout = setlog::WorkoutFactory::create_from_template_at(Some(&template), start);
        workout.exercises.truncate(1);
        session.start(workout).unwrap();
        session.finish_workout_at(start + Duration::minutes(30)).unwrap().unwrap().id
    };

    let store = KvCatalog::new(SqliteBackend::new(&db_path).unwrap());
    let log = store.find_log(&log_id).unwrap();
    assert_eq!(log.start_time, start);
    assert_eq!(log.duration_minutes, Some(30));
    assert_eq!(log.exercises.len(), 1);
    assert_eq!(store.get_templates().unwrap().len(), 1);
    assert!(store.get_muscle_groups().unwrap().contains(&"ARMS".to_string()));

    let mut store = store;
    assert!(store.delete_log(&log_id).unwrap());
    assert!(store.get_logs().unwrap().is_empty());
}
