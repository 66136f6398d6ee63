//! Attempt timer implementation.
//!
//! The timer is a wall-clock-based state machine. It does not use internal
//! threads - the caller drives it (pause/resume commands, periodic autosave
//! ticks from the session layer).
//!
//! ## State Transitions
//!
//! ```text
//! NotStarted -> Running <-> Paused -> Finalized
//!               Running | Paused   -> Cancelled
//! ```
//!
//! Elapsed time accumulates only while `Running`; wall time spent `Paused`
//! never counts toward the attempt duration.

use serde::{Deserialize, Serialize};

use crate::error::AttemptError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    NotStarted,
    Running,
    Paused,
    Finalized,
    Cancelled,
}

impl TimerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::NotStarted => "not_started",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
            TimerState::Finalized => "finalized",
            TimerState::Cancelled => "cancelled",
        }
    }
}

/// Count-up timer for one exercise attempt.
///
/// Operates on wall-clock deltas -- no internal thread. Serializable so the
/// in-progress checkpoint (and the CLI's cross-invocation state) is just a
/// snapshot of this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptTimer {
    state: TimerState,
    /// Active milliseconds accumulated across completed running segments.
    elapsed_ms: u64,
    /// Timestamp (ms since epoch) when the current running segment began.
    /// `Some` only while `Running`.
    #[serde(default)]
    last_resumed_epoch_ms: Option<u64>,
}

impl Default for AttemptTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl AttemptTimer {
    pub fn new() -> Self {
        Self {
            state: TimerState::NotStarted,
            elapsed_ms: 0,
            last_resumed_epoch_ms: None,
        }
    }

    /// Reconstruct a paused timer from a checkpointed elapsed duration.
    /// Used by session recovery: the learner resumes explicitly.
    pub fn paused_with_elapsed(elapsed_ms: u64) -> Self {
        Self {
            state: TimerState::Paused,
            elapsed_ms,
            last_resumed_epoch_ms: None,
        }
    }

    /// Reconstruct a running timer whose current segment began at
    /// `last_resumed_epoch_ms`. Used for live continuation between CLI
    /// invocations: the segment keeps accruing across process boundaries.
    pub fn running_with_elapsed(elapsed_ms: u64, last_resumed_epoch_ms: u64) -> Self {
        Self {
            state: TimerState::Running,
            elapsed_ms,
            last_resumed_epoch_ms: Some(last_resumed_epoch_ms),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == TimerState::Paused
    }

    /// Start of the current running segment, if any.
    pub fn last_resumed_epoch_ms(&self) -> Option<u64> {
        self.last_resumed_epoch_ms
    }

    /// Total active milliseconds, including the live running segment.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms_at(now_ms())
    }

    fn elapsed_ms_at(&self, now: u64) -> u64 {
        match self.last_resumed_epoch_ms {
            Some(since) if self.state == TimerState::Running => {
                self.elapsed_ms + now.saturating_sub(since)
            }
            _ => self.elapsed_ms,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin timing. Valid only from `NotStarted`.
    ///
    /// # Errors
    /// Returns `AttemptError::InvalidTransition` from any other state.
    pub fn start(&mut self) -> Result<(), AttemptError> {
        self.start_at(now_ms())
    }

    fn start_at(&mut self, now: u64) -> Result<(), AttemptError> {
        if self.state != TimerState::NotStarted {
            return Err(self.invalid("start"));
        }
        self.state = TimerState::Running;
        self.last_resumed_epoch_ms = Some(now);
        Ok(())
    }

    /// Suspend timing. Valid only from `Running`.
    ///
    /// # Errors
    /// Returns `AttemptError::InvalidTransition` from any other state.
    pub fn pause(&mut self) -> Result<(), AttemptError> {
        self.pause_at(now_ms())
    }

    fn pause_at(&mut self, now: u64) -> Result<(), AttemptError> {
        if self.state != TimerState::Running {
            return Err(self.invalid("pause"));
        }
        self.flush_segment(now);
        self.state = TimerState::Paused;
        Ok(())
    }

    /// Continue timing. Valid only from `Paused`.
    ///
    /// # Errors
    /// Returns `AttemptError::InvalidTransition` from any other state.
    pub fn resume(&mut self) -> Result<(), AttemptError> {
        self.resume_at(now_ms())
    }

    fn resume_at(&mut self, now: u64) -> Result<(), AttemptError> {
        if self.state != TimerState::Paused {
            return Err(self.invalid("resume"));
        }
        self.state = TimerState::Running;
        self.last_resumed_epoch_ms = Some(now);
        Ok(())
    }

    /// Stop and return the total active milliseconds. Valid from `Running`
    /// or `Paused`.
    ///
    /// # Errors
    /// Returns `AttemptError::InvalidTransition` from any other state.
    pub fn finalize(&mut self) -> Result<u64, AttemptError> {
        self.finalize_at(now_ms())
    }

    fn finalize_at(&mut self, now: u64) -> Result<u64, AttemptError> {
        match self.state {
            TimerState::Running | TimerState::Paused => {
                self.flush_segment(now);
                self.state = TimerState::Finalized;
                Ok(self.elapsed_ms)
            }
            _ => Err(self.invalid("finalize")),
        }
    }

    /// Abandon the attempt, returning the active milliseconds accumulated so
    /// far. Valid from `Running` or `Paused`.
    ///
    /// # Errors
    /// Returns `AttemptError::InvalidTransition` from any other state.
    pub fn cancel(&mut self) -> Result<u64, AttemptError> {
        self.cancel_at(now_ms())
    }

    fn cancel_at(&mut self, now: u64) -> Result<u64, AttemptError> {
        match self.state {
            TimerState::Running | TimerState::Paused => {
                self.flush_segment(now);
                self.state = TimerState::Cancelled;
                Ok(self.elapsed_ms)
            }
            _ => Err(self.invalid("cancel")),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Fold the live running segment into `elapsed_ms`.
    fn flush_segment(&mut self, now: u64) {
        if let Some(since) = self.last_resumed_epoch_ms.take() {
            self.elapsed_ms += now.saturating_sub(since);
        }
    }

    fn invalid(&self, command: &'static str) -> AttemptError {
        AttemptError::InvalidTransition {
            command,
            state: self.state.as_str(),
        }
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_pause_resume_finalize() {
        let mut timer = AttemptTimer::new();
        assert_eq!(timer.state(), TimerState::NotStarted);

        timer.start().unwrap();
        assert_eq!(timer.state(), TimerState::Running);

        timer.pause().unwrap();
        assert_eq!(timer.state(), TimerState::Paused);

        timer.resume().unwrap();
        assert_eq!(timer.state(), TimerState::Running);

        timer.finalize().unwrap();
        assert_eq!(timer.state(), TimerState::Finalized);
    }

    #[test]
    fn paused_time_does_not_count() {
        // start at t=0, run 5s, pause 100s, run 5s more, finalize.
        let mut timer = AttemptTimer::new();
        timer.start_at(0).unwrap();
        timer.pause_at(5_000).unwrap();
        timer.resume_at(105_000).unwrap();
        let total = timer.finalize_at(110_000).unwrap();
        assert_eq!(total, 10_000);
    }

    #[test]
    fn elapsed_is_monotonic_while_running() {
        let mut timer = AttemptTimer::new();
        timer.start_at(1_000).unwrap();
        assert_eq!(timer.elapsed_ms_at(1_000), 0);
        assert_eq!(timer.elapsed_ms_at(3_000), 2_000);
        assert_eq!(timer.elapsed_ms_at(9_000), 8_000);
        // A clock step backwards never yields a negative duration.
        assert_eq!(timer.elapsed_ms_at(500), 0);
    }

    #[test]
    fn pause_freezes_elapsed() {
        let mut timer = AttemptTimer::new();
        timer.start_at(0).unwrap();
        timer.pause_at(4_000).unwrap();
        assert_eq!(timer.elapsed_ms_at(50_000), 4_000);
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let mut timer = AttemptTimer::new();
        assert!(matches!(
            timer.pause(),
            Err(AttemptError::InvalidTransition {
                command: "pause",
                ..
            })
        ));
        timer.start().unwrap();
        assert!(timer.start().is_err());
        assert!(timer.resume().is_err());
        timer.finalize().unwrap();
        assert!(timer.cancel().is_err());
        assert!(timer.finalize().is_err());
    }

    #[test]
    fn cancel_from_paused_returns_elapsed() {
        let mut timer = AttemptTimer::new();
        timer.start_at(0).unwrap();
        timer.pause_at(7_000).unwrap();
        let elapsed = timer.cancel_at(30_000).unwrap();
        assert_eq!(elapsed, 7_000);
        assert_eq!(timer.state(), TimerState::Cancelled);
    }

    #[test]
    fn recovery_constructor_is_paused_at_checkpoint() {
        let mut timer = AttemptTimer::paused_with_elapsed(42_000);
        assert_eq!(timer.state(), TimerState::Paused);
        assert_eq!(timer.elapsed_ms(), 42_000);
        timer.resume_at(100_000).unwrap();
        assert_eq!(timer.elapsed_ms_at(101_000), 43_000);
    }

    #[test]
    fn running_reconstruction_keeps_accruing() {
        let timer = AttemptTimer::running_with_elapsed(10_000, 60_000);
        assert_eq!(timer.elapsed_ms_at(65_000), 15_000);
    }

    #[test]
    fn serde_round_trip_preserves_state() {
        let mut timer = AttemptTimer::new();
        timer.start_at(0).unwrap();
        timer.pause_at(3_000).unwrap();
        let json = serde_json::to_string(&timer).unwrap();
        let back: AttemptTimer = serde_json::from_str(&json).unwrap();
        assert_eq!(back.state(), TimerState::Paused);
        assert_eq!(back.elapsed_ms(), 3_000);
    }
}
