use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{RecordKind, StorageError};
use crate::models::{Equipment, Exercise, ExerciseEdit, ExerciseType, Template, WorkoutLog};
use crate::settings::Settings;

/// Fixed keys of the catalog records
pub mod keys {
    pub const EXERCISES: &str = "setlog:exercises";
    pub const TEMPLATES: &str = "setlog:templates";
    pub const LOGS: &str = "setlog:logs";
    pub const SETTINGS: &str = "setlog:settings";
    pub const MUSCLE_GROUPS: &str = "setlog:muscle_groups";
}

/// Muscle groups offered before the user adds any
pub const DEFAULT_MUSCLE_GROUPS: [&str; 7] = ["GENERAL", "CHEST", "BACK", "LEGS", "SHOULDERS", "ARMS", "CORE"];

/// Opaque string store the catalog is persisted in
pub trait KeyValueBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn clear(&mut self) -> Result<(), StorageError>;
}

/// Persistence contract for exercises, templates, logs and settings.
///
/// Deletes report whether a record was removed; a missing id is not an error.
pub trait CatalogStore {
    fn get_exercises(&self) -> Result<Vec<Exercise>, StorageError>;
    /// Insert or replace by id
    fn save_exercise(&mut self, exercise: &Exercise) -> Result<(), StorageError>;
    fn delete_exercise(&mut self, id: &str) -> Result<bool, StorageError>;

    fn get_templates(&self) -> Result<Vec<Template>, StorageError>;
    /// Insert or replace by id
    fn save_template(&mut self, template: &Template) -> Result<(), StorageError>;
    fn delete_template(&mut self, id: &str) -> Result<bool, StorageError>;

    fn get_logs(&self) -> Result<Vec<WorkoutLog>, StorageError>;
    /// Append to history
    fn save_log(&mut self, log: &WorkoutLog) -> Result<(), StorageError>;
    fn delete_log(&mut self, id: &str) -> Result<bool, StorageError>;

    /// Stored settings merged over the defaults
    fn get_settings(&self) -> Result<Settings, StorageError>;
    fn save_settings(&mut self, settings: &Settings) -> Result<(), StorageError>;

    fn get_muscle_groups(&self) -> Result<Vec<String>, StorageError>;
    fn save_muscle_groups(&mut self, groups: &[String]) -> Result<(), StorageError>;

    fn find_template(&self, id: &str) -> Result<Template, StorageError> {
        self.get_templates()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| StorageError::NotFound {
                kind: RecordKind::Template,
                id: id.to_string(),
            })
    }

    fn find_exercise(&self, id: &str) -> Result<Exercise, StorageError> {
        self.get_exercises()?
            .into_iter()
            .find(|e| e.id == id)
            .ok_or_else(|| StorageError::NotFound {
                kind: RecordKind::Exercise,
                id: id.to_string(),
            })
    }

    fn find_log(&self, id: &str) -> Result<WorkoutLog, StorageError> {
        self.get_logs()?
            .into_iter()
            .find(|l| l.id == id)
            .ok_or_else(|| StorageError::NotFound {
                kind: RecordKind::Log,
                id: id.to_string(),
            })
    }

    /// Create and save a catalog exercise, registering its muscle group if new
    fn add_exercise(
        &mut self,
        name: &str,
        category: &str,
        exercise_type: ExerciseType,
        equipment: &[Equipment],
    ) -> Result<Exercise, StorageError> {
        let exercise = Exercise::new(name.trim(), category, exercise_type).with_equipment(equipment);

        self.register_muscle_group(&exercise.category)?;
        self.save_exercise(&exercise)?;
        info!(exercise_id = %exercise.id, category = %exercise.category, "Added exercise");
        Ok(exercise)
    }

    /// Apply `edit` to a stored exercise, registering a new muscle group if needed
    fn edit_exercise(&mut self, id: &str, edit: &ExerciseEdit) -> Result<Exercise, StorageError> {
        let exercise = edit.apply_to(&self.find_exercise(id)?);

        self.register_muscle_group(&exercise.category)?;
        self.save_exercise(&exercise)?;
        info!(exercise_id = %exercise.id, category = %exercise.category, "Updated exercise");
        Ok(exercise)
    }

    /// Add `category` to the sorted muscle group list if missing
    fn register_muscle_group(&mut self, category: &str) -> Result<(), StorageError> {
        let mut groups = self.get_muscle_groups()?;
        if groups.iter().any(|g| g == category) {
            return Ok(());
        }
        groups.push(category.to_string());
        groups.sort();
        self.save_muscle_groups(&groups)
    }
}

/// [`CatalogStore`] over JSON documents in a key-value backend
pub struct KvCatalog<B: KeyValueBackend> {
    backend: B,
}

impl<B: KeyValueBackend> KvCatalog<B> {
    pub fn new(backend: B) -> Self {
        KvCatalog { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Remove every record
    pub fn reset(&mut self) -> Result<(), StorageError> {
        self.backend.clear()
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.backend.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StorageError::Serialization {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    fn store<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|e| StorageError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.backend.set(key, &raw)?;
        debug!(key, bytes = raw.len(), "Stored catalog record");
        Ok(())
    }

    fn load_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StorageError> {
        Ok(self.load::<Vec<T>>(key)?.unwrap_or_default())
    }
}

impl<B: KeyValueBackend> CatalogStore for KvCatalog<B> {
    fn get_exercises(&self) -> Result<Vec<Exercise>, StorageError> {
        self.load_list(keys::EXERCISES)
    }

    fn save_exercise(&mut self, exercise: &Exercise) -> Result<(), StorageError> {
        let mut exercises = self.get_exercises()?;
        match exercises.iter_mut().find(|e| e.id == exercise.id) {
            Some(existing) => *existing = exercise.clone(),
            None => exercises.push(exercise.clone()),
        }
        self.store(keys::EXERCISES, &exercises)
    }

    fn delete_exercise(&mut self, id: &str) -> Result<bool, StorageError> {
        let mut exercises = self.get_exercises()?;
        let before = exercises.len();
        exercises.retain(|e| e.id != id);
        if exercises.len() == before {
            return Ok(false);
        }
        self.store(keys::EXERCISES, &exercises)?;
        Ok(true)
    }

    fn get_templates(&self) -> Result<Vec<Template>, StorageError> {
        self.load_list(keys::TEMPLATES)
    }

    fn save_template(&mut self, template: &Template) -> Result<(), StorageError> {
        let mut templates = self.get_templates()?;
        match templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template.clone(),
            None => templates.push(template.clone()),
        }
        self.store(keys::TEMPLATES, &templates)
    }

    fn delete_template(&mut self, id: &str) -> Result<bool, StorageError> {
        let mut templates = self.get_templates()?;
        let before = templates.len();
        templates.retain(|t| t.id != id);
        if templates.len() == before {
            return Ok(false);
        }
        self.store(keys::TEMPLATES, &templates)?;
        Ok(true)
    }

    fn get_logs(&self) -> Result<Vec<WorkoutLog>, StorageError> {
        self.load_list(keys::LOGS)
    }

    fn save_log(&mut self, log: &WorkoutLog) -> Result<(), StorageError> {
        let mut logs = self.get_logs()?;
        logs.push(log.clone());
        self.store(keys::LOGS, &logs)
    }

    fn delete_log(&mut self, id: &str) -> Result<bool, StorageError> {
        let mut logs = self.get_logs()?;
        let before = logs.len();
        logs.retain(|l| l.id != id);
        if logs.len() == before {
            return Ok(false);
        }
        self.store(keys::LOGS, &logs)?;
        Ok(true)
    }

    fn get_settings(&self) -> Result<Settings, StorageError> {
        Ok(self.load::<Settings>(keys::SETTINGS)?.unwrap_or_default())
    }

    fn save_settings(&mut self, settings: &Settings) -> Result<(), StorageError> {
        self.store(keys::SETTINGS, settings)
    }

    fn get_muscle_groups(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .load::<Vec<String>>(keys::MUSCLE_GROUPS)?
            .unwrap_or_else(|| DEFAULT_MUSCLE_GROUPS.iter().map(|g| g.to_string()).collect()))
    }

    fn save_muscle_groups(&mut self, groups: &[String]) -> Result<(), StorageError> {
        self.store(keys::MUSCLE_GROUPS, groups)
    }
}

/// SQLite-backed key-value store, one row per key
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Create or open a database at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path.as_ref())?;
        let backend = Self::with_connection(conn)?;
        info!(path = %db_path.as_ref().display(), "Opened catalog database");
        Ok(backend)
    }

    /// Private database that disappears when dropped
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        let backend = SqliteBackend { conn };
        backend.init_schema()?;
        Ok(backend)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(())
    }
}

impl KeyValueBackend for SqliteBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value: Option<String> = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)",
            params![key, value],
        )?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM kv", [])?;
        Ok(())
    }
}

/// In-process backend for tests and dry runs
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.entries.clear();
        Ok(())
    }
}

/// Catalog kept in memory
pub type MemoryCatalog = KvCatalog<MemoryBackend>;

/// Catalog kept in a SQLite file
pub type SqliteCatalog = KvCatalog<SqliteBackend>;

impl MemoryCatalog {
    pub fn in_memory() -> Self {
        KvCatalog::new(MemoryBackend::new())
    }
}

impl SqliteCatalog {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, StorageError> {
        Ok(KvCatalog::new(SqliteBackend::new(db_path)?))
    }
}
