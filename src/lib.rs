// Library interface for SetLog modules
// This allows integration tests to access the core functionality

pub mod config;
pub mod error;
pub mod export;
pub mod factory;
pub mod grouping;
pub mod history;
pub mod logging;
pub mod models;
pub mod mutations;
pub mod session;
pub mod settings;
pub mod storage;
pub mod template;
pub mod volume;

// Re-export commonly used types for convenience
pub use models::*;
pub use error::{ErrorSeverity, Result, SessionError, SetLogError, StorageError};
pub use export::{ExportError, ExportManager, ExportSink, FileSink, MarkdownGenerator, StdoutSink};
pub use factory::{TargetOverride, WorkoutFactory};
pub use grouping::{group_exercises, ExerciseGroup};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use session::{SessionOptions, WorkoutSession};
pub use settings::{Settings, YamlMapping};
pub use storage::{CatalogStore, KvCatalog, MemoryCatalog, SqliteCatalog};
pub use volume::{VolumeCalculator, VolumePolicy};
