mod config;
pub mod database;
pub mod migrations;

pub use config::Config;
pub use database::{
    AggregateStats, AttemptRecord, Candidate, Checkpoint, Database, ExerciseStats, Outcome,
    TimePerPointEntry,
};

use std::path::PathBuf;

use crate::error::{CoreError, Result};

/// Returns `~/.config/studydrill[-dev]/` based on STUDYDRILL_ENV.
///
/// Set STUDYDRILL_ENV=dev to use a separate development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STUDYDRILL_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("studydrill-dev")
    } else {
        base_dir.join("studydrill")
    };

    std::fs::create_dir_all(&dir).map_err(CoreError::Io)?;
    Ok(dir)
}
