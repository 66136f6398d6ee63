//! Attempt lifecycle events.
//!
//! Every state change produces an `Event`; the CLI prints them as tagged
//! JSON, and an embedding UI can subscribe to the same stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    AttemptStarted {
        exercise_id: i64,
        exercise: String,
        points: u32,
        at: DateTime<Utc>,
    },
    AttemptPaused {
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    AttemptResumed {
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    AttemptFinalized {
        exercise_id: i64,
        attempt_id: i64,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    AttemptCancelled {
        exercise_id: i64,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    /// The in-progress checkpoint was written (autosave tick).
    CheckpointSaved {
        exercise_id: i64,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        exercise_id: Option<i64>,
        exercise: Option<String>,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
}
