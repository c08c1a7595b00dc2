//! Unified error hierarchy for SetLog
//!
//! Session, storage and export failures each have their own enum and roll up
//! into [`SetLogError`], which carries severity and user-facing messages.

use thiserror::Error;

use crate::export::ExportError;

/// Top-level error type for all SetLog operations
#[derive(Debug, Error)]
pub enum SetLogError {
    /// Live session errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Catalog store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Markdown export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What kind of record a lookup failed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    ExerciseInstance,
    Set,
    Template,
    Exercise,
    Log,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::ExerciseInstance => write!(f, "exercise instance"),
            RecordKind::Set => write!(f, "set"),
            RecordKind::Template => write!(f, "template"),
            RecordKind::Exercise => write!(f, "exercise"),
            RecordKind::Log => write!(f, "log"),
        }
    }
}

/// Errors raised by the set mutation API and the active-workout slot
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A mutation referenced an id that is not in the active workout
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    /// A mutation was attempted while no workout is active
    #[error("No active workout")]
    NoActiveWorkout,

    /// A workout was started while another one is still active
    #[error("A workout is already active: {id}")]
    ActiveWorkoutAlreadyExists { id: String },

    /// Arguments that can never produce a valid workout
    #[error("Invalid session operation: {0}")]
    Validation(String),
}

impl SessionError {
    pub fn instance_not_found(id: &str) -> Self {
        SessionError::NotFound {
            kind: RecordKind::ExerciseInstance,
            id: id.to_string(),
        }
    }

    pub fn set_not_found(id: &str) -> Self {
        SessionError::NotFound {
            kind: RecordKind::Set,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound { .. })
    }
}

/// Catalog store errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error for {key}: {reason}")]
    Serialization { key: String, reason: String },

    #[error("Record not found: {kind} {id}")]
    NotFound { kind: RecordKind, id: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for SetLog operations
pub type Result<T> = std::result::Result<T, SetLogError>;

impl SetLogError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SetLogError::Session(SessionError::NotFound { .. }) => ErrorSeverity::Warning,
            SetLogError::Session(SessionError::NoActiveWorkout) => ErrorSeverity::Warning,
            SetLogError::Session(_) => ErrorSeverity::Error,
            SetLogError::Storage(StorageError::NotFound { .. }) => ErrorSeverity::Warning,
            SetLogError::Storage(StorageError::Sqlite(_)) => ErrorSeverity::Critical,
            SetLogError::Validation(_) => ErrorSeverity::Warning,
            SetLogError::Export(_) => ErrorSeverity::Error,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            SetLogError::Session(SessionError::NoActiveWorkout) => {
                "No workout is running. Start one from a template first.".to_string()
            }
            SetLogError::Session(SessionError::ActiveWorkoutAlreadyExists { .. }) => {
                "Finish or cancel the current workout before starting a new one.".to_string()
            }
            SetLogError::Export(err) => err.user_message(),
            SetLogError::Storage(StorageError::Sqlite(_)) => {
                "Unable to open the workout database. Please check your configuration.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = SetLogError::Session(SessionError::set_not_found("s1"));
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err = SetLogError::Session(SessionError::ActiveWorkoutAlreadyExists {
            id: "w1".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Error);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_not_found_display() {
        let err = SessionError::instance_not_found("abc");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "exercise instance not found: abc");
    }

    #[test]
    fn test_user_messages() {
        let err = SetLogError::Session(SessionError::NoActiveWorkout);
        assert!(err.user_message().contains("No workout is running"));

        let err = SetLogError::Export(ExportError::UnfinishedWorkout {
            id: "w1".to_string(),
        });
        assert_eq!(err.user_message(), crate::export::EXPORT_FAILURE_MESSAGE);
    }
}
