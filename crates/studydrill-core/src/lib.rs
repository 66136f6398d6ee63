//! # Studydrill Core Library
//!
//! Core business logic for the studydrill practice trainer: pick the next
//! exercise from a scored bank, time the attempt, and persist the history.
//! CLI-first - every operation is available through the standalone CLI
//! binary, which is a thin layer over this library.
//!
//! ## Architecture
//!
//! - **Selection engine**: round-based and slowest-time-per-point policies
//!   over a score-range filter; a pure read of the attempt log
//! - **Attempt timer**: a wall-clock-based state machine that requires the
//!   caller to drive it (pause/resume commands, autosave ticks)
//! - **Storage**: SQLite attempt log and exercise catalog, TOML-based
//!   configuration
//! - **Session**: the single in-progress attempt slot, with checkpointed
//!   crash recovery
//!
//! ## Key Components
//!
//! - [`select_next`]: selection engine entry point
//! - [`AttemptTimer`]: core timer state machine
//! - [`Database`]: catalog, attempt log and checkpoint persistence
//! - [`Session`]: attempt lifecycle and recovery
//! - [`Config`]: application configuration management

pub mod catalog;
pub mod error;
pub mod events;
pub mod select;
pub mod session;
pub mod storage;
pub mod timer;

pub use catalog::{Exam, Exercise, ExerciseFilter, ScoreRange};
pub use error::{AttemptError, ConfigError, CoreError, DatabaseError, SelectionError};
pub use events::Event;
pub use select::{round_progress, select_next, Policy, RoundProgress};
pub use session::{ActiveAttempt, Session};
pub use storage::{
    AggregateStats, AttemptRecord, Candidate, Checkpoint, Config, Database, ExerciseStats,
    Outcome, TimePerPointEntry,
};
pub use timer::{AttemptTimer, TimerState};
