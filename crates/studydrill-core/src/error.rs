//! Core error types for studydrill-core.
//!
//! Every fallible operation surfaces one of the enums below; `CoreError`
//! is the umbrella used at the crate boundary.

use thiserror::Error;

/// Core error type for studydrill-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Selection engine errors
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    /// Attempt lifecycle errors
    #[error("Attempt error: {0}")]
    Attempt(#[from] AttemptError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: std::path::PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// An attempt referenced an exercise id that is not in the catalog.
    /// Indicates a catalog/store inconsistency; fatal for the operation.
    #[error("Exercise {0} not found in catalog")]
    ExerciseNotFound(i64),

    /// A stored in-progress checkpoint could not be decoded.
    #[error("Stored checkpoint is corrupt: {0}")]
    CorruptCheckpoint(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed {
        path: std::path::PathBuf,
        message: String,
    },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed {
        path: std::path::PathBuf,
        message: String,
    },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse a configuration value
    #[error("Cannot parse value for '{key}': {message}")]
    ParseFailed { key: String, message: String },
}

/// Selection engine errors. All recoverable: the caller re-prompts for a
/// filter or falls back to another policy.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    /// min > max or otherwise unusable bounds
    #[error("Invalid score range: min ({min}) must not exceed max ({max})")]
    InvalidRange { min: u32, max: u32 },

    /// The score filter matches no exercise in the catalog.
    #[error("No exercises match the requested score range")]
    NoCandidates,

    /// Slowest-time-per-point needs at least one completed attempt in range.
    #[error("No exercise in range has a completed attempt yet")]
    NoAttemptedCandidates,
}

/// Attempt lifecycle errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AttemptError {
    /// Only one attempt may be in progress at a time.
    #[error("An attempt is already in progress (exercise {exercise_id})")]
    AlreadyInProgress { exercise_id: i64 },

    /// Pause/resume/finalize/cancel called with no active attempt.
    #[error("No attempt is in progress")]
    NoAttemptInProgress,

    /// A timer command was issued in a state that does not allow it.
    #[error("Invalid timer transition: cannot {command} while {state}")]
    InvalidTransition {
        command: &'static str,
        state: &'static str,
    },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
