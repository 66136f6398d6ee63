//! Single-slot practice session.
//!
//! At most one attempt is in progress at a time; the slot is guarded both in
//! memory and by the durable checkpoint row, so a second `start` fails with
//! `AttemptAlreadyInProgress` even after a process restart.
//!
//! The session layer glues the attempt timer to the store: it writes the
//! autosave checkpoint (cooperative `tick`, no threads), appends the attempt
//! record on finalize, and reconstructs interrupted attempts on startup.

use chrono::{DateTime, Utc};

use crate::catalog::Exercise;
use crate::error::{AttemptError, CoreError, DatabaseError, Result};
use crate::events::Event;
use crate::storage::{Checkpoint, Config, Database, Outcome};
use crate::timer::{AttemptTimer, TimerState};

/// The one attempt currently being timed.
#[derive(Debug, Clone)]
pub struct ActiveAttempt {
    exercise: Exercise,
    timer: AttemptTimer,
    started_at: DateTime<Utc>,
    last_autosave_epoch_ms: u64,
}

impl ActiveAttempt {
    pub fn exercise(&self) -> &Exercise {
        &self.exercise
    }

    pub fn state(&self) -> TimerState {
        self.timer.state()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.timer.elapsed_ms()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            exercise_id: self.exercise.id,
            elapsed_ms: self.timer.elapsed_ms(),
            running: self.timer.is_running(),
            last_resumed_epoch_ms: self.timer.last_resumed_epoch_ms(),
            started_at: self.started_at,
            saved_at: Utc::now(),
        }
    }
}

/// Practice session holding the single active-attempt slot.
pub struct Session {
    autosave_interval_ms: u64,
    record_abandoned: bool,
    active: Option<ActiveAttempt>,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self {
            autosave_interval_ms: config.attempt.autosave_interval_secs * 1000,
            record_abandoned: config.attempt.record_abandoned,
            active: None,
        }
    }

    /// Rebuild a session from the stored checkpoint, continuing a running
    /// segment across process boundaries (the CLI path). A corrupt
    /// checkpoint is cleared and ignored.
    ///
    /// # Errors
    /// Returns database errors, or `ExerciseNotFound` if the checkpointed
    /// exercise vanished from the catalog.
    pub fn load(config: &Config, db: &Database) -> Result<Self> {
        let mut session = Self::new(config);
        let Some(cp) = Self::recoverable(db)? else {
            return Ok(session);
        };
        let exercise = db
            .get_exercise(cp.exercise_id)?
            .ok_or(DatabaseError::ExerciseNotFound(cp.exercise_id))?;
        let timer = match cp.last_resumed_epoch_ms {
            Some(since) if cp.running => AttemptTimer::running_with_elapsed(cp.elapsed_ms, since),
            _ => AttemptTimer::paused_with_elapsed(cp.elapsed_ms),
        };
        session.active = Some(ActiveAttempt {
            exercise,
            timer,
            started_at: cp.started_at,
            last_autosave_epoch_ms: now_ms(),
        });
        Ok(session)
    }

    pub fn active(&self) -> Option<&ActiveAttempt> {
        self.active.as_ref()
    }

    /// Begin timing an attempt on `exercise_id`.
    ///
    /// # Errors
    /// - `AttemptError::AlreadyInProgress` if this session, or a checkpoint
    ///   left by an earlier process, holds an unfinished attempt.
    /// - `DatabaseError::ExerciseNotFound` for an unknown exercise.
    pub fn start(&mut self, db: &Database, exercise_id: i64) -> Result<Event> {
        if let Some(active) = &self.active {
            return Err(AttemptError::AlreadyInProgress {
                exercise_id: active.exercise.id,
            }
            .into());
        }
        if let Some(cp) = Self::recoverable(db)? {
            return Err(AttemptError::AlreadyInProgress {
                exercise_id: cp.exercise_id,
            }
            .into());
        }
        let exercise = db
            .get_exercise(exercise_id)?
            .ok_or(DatabaseError::ExerciseNotFound(exercise_id))?;

        let mut timer = AttemptTimer::new();
        timer.start()?;
        let attempt = ActiveAttempt {
            exercise,
            timer,
            started_at: Utc::now(),
            last_autosave_epoch_ms: now_ms(),
        };
        db.save_checkpoint(&attempt.checkpoint())?;

        let event = Event::AttemptStarted {
            exercise_id: attempt.exercise.id,
            exercise: attempt.exercise.display_name(),
            points: attempt.exercise.points,
            at: Utc::now(),
        };
        self.active = Some(attempt);
        Ok(event)
    }

    /// Pause the active attempt. Paused wall time never counts toward the
    /// duration.
    ///
    /// # Errors
    /// `AttemptError::NoAttemptInProgress` with an empty slot, or an invalid
    /// transition from the timer.
    pub fn pause(&mut self, db: &Database) -> Result<Event> {
        let active = self.active_mut()?;
        active.timer.pause()?;
        // Best effort: a failed write is retried on the next autosave tick.
        Self::try_autosave(db, active);
        Ok(Event::AttemptPaused {
            elapsed_ms: active.timer.elapsed_ms(),
            at: Utc::now(),
        })
    }

    /// Resume the paused attempt.
    ///
    /// # Errors
    /// `AttemptError::NoAttemptInProgress` with an empty slot, or an invalid
    /// transition from the timer.
    pub fn resume(&mut self, db: &Database) -> Result<Event> {
        let active = self.active_mut()?;
        active.timer.resume()?;
        Self::try_autosave(db, active);
        Ok(Event::AttemptResumed {
            elapsed_ms: active.timer.elapsed_ms(),
            at: Utc::now(),
        })
    }

    /// Cooperative autosave: call once per loop iteration. Writes the
    /// checkpoint when at least the configured interval of wall time has
    /// passed since the last save. Write failures are swallowed and retried
    /// on the next tick - autosave never blocks the learner.
    ///
    /// # Errors
    /// Never fails today; the `Result` keeps the signature uniform with the
    /// other lifecycle operations.
    pub fn tick(&mut self, db: &Database) -> Result<Option<Event>> {
        let Some(active) = self.active.as_mut() else {
            return Ok(None);
        };
        if !matches!(
            active.timer.state(),
            TimerState::Running | TimerState::Paused
        ) {
            return Ok(None);
        }
        let now = now_ms();
        if now.saturating_sub(active.last_autosave_epoch_ms) < self.autosave_interval_ms {
            return Ok(None);
        }
        if !Self::try_autosave(db, active) {
            return Ok(None);
        }
        Ok(Some(Event::CheckpointSaved {
            exercise_id: active.exercise.id,
            elapsed_ms: active.timer.elapsed_ms(),
            at: Utc::now(),
        }))
    }

    /// Finish the attempt: append a completed record, clear the checkpoint,
    /// free the slot.
    ///
    /// A failed append is surfaced and leaves the attempt (and its
    /// checkpoint) intact - lost learner progress must never be silent.
    ///
    /// # Errors
    /// `AttemptError::NoAttemptInProgress`, invalid timer transitions, or
    /// the store error from the append.
    pub fn finalize(&mut self, db: &Database) -> Result<Event> {
        let active = self.active_mut()?;
        if !matches!(
            active.timer.state(),
            TimerState::Running | TimerState::Paused
        ) {
            return Err(AttemptError::InvalidTransition {
                command: "finalize",
                state: active.timer.state().as_str(),
            }
            .into());
        }

        // Measure first, commit second: the timer is only finalized once the
        // record is durably appended, so a write failure leaves everything
        // recoverable.
        let duration_secs = active.timer.elapsed_ms() / 1000;
        let attempt_id = db.record_attempt(
            active.exercise.id,
            active.started_at,
            duration_secs,
            Outcome::Completed,
        )?;
        db.clear_checkpoint()?;
        let _ = active.timer.finalize();

        let exercise_id = active.exercise.id;
        self.active = None;
        Ok(Event::AttemptFinalized {
            exercise_id,
            attempt_id,
            duration_secs,
            at: Utc::now(),
        })
    }

    /// Abandon the attempt. The checkpoint is discarded; no completed record
    /// is written. With `record_abandoned` set, an `abandoned` row keeps an
    /// audit trail without ever counting as a repetition.
    ///
    /// # Errors
    /// `AttemptError::NoAttemptInProgress`, invalid timer transitions, or a
    /// store error from the cleanup.
    pub fn cancel(&mut self, db: &Database) -> Result<Event> {
        let record_abandoned = self.record_abandoned;
        let active = self.active_mut()?;
        let elapsed_ms = active.timer.cancel()?;
        let exercise_id = active.exercise.id;
        let started_at = active.started_at;
        self.active = None;
        db.clear_checkpoint()?;
        if record_abandoned {
            db.record_attempt(
                exercise_id,
                started_at,
                elapsed_ms / 1000,
                Outcome::Abandoned,
            )?;
        }
        Ok(Event::AttemptCancelled {
            exercise_id,
            elapsed_ms,
            at: Utc::now(),
        })
    }

    /// Current state as an event, for status displays.
    pub fn snapshot(&self) -> Event {
        match &self.active {
            Some(active) => Event::StateSnapshot {
                state: active.timer.state(),
                exercise_id: Some(active.exercise.id),
                exercise: Some(active.exercise.display_name()),
                elapsed_ms: active.timer.elapsed_ms(),
                at: Utc::now(),
            },
            None => Event::StateSnapshot {
                state: TimerState::NotStarted,
                exercise_id: None,
                exercise: None,
                elapsed_ms: 0,
                at: Utc::now(),
            },
        }
    }

    // ── Session recovery ─────────────────────────────────────────────

    /// The interrupted attempt left behind by an earlier process, if any.
    /// A checkpoint that fails to decode is cleared and reported as absent -
    /// recovery never trusts a partial row.
    ///
    /// # Errors
    /// Returns database errors other than checkpoint corruption.
    pub fn recoverable(db: &Database) -> Result<Option<Checkpoint>> {
        match db.load_checkpoint() {
            Ok(cp) => Ok(cp),
            Err(DatabaseError::CorruptCheckpoint(_)) => {
                db.clear_checkpoint()?;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Reconstruct the interrupted attempt into this session's slot. The
    /// timer comes back **paused** at the checkpointed elapsed duration
    /// (loss bounded by one autosave interval); the learner resumes
    /// explicitly.
    ///
    /// # Errors
    /// `AttemptError::AlreadyInProgress` if the slot is occupied,
    /// `AttemptError::NoAttemptInProgress` if there is nothing to recover,
    /// or `ExerciseNotFound` if the catalog no longer has the exercise.
    pub fn resume_recovered(&mut self, db: &Database) -> Result<Event> {
        if let Some(active) = &self.active {
            return Err(AttemptError::AlreadyInProgress {
                exercise_id: active.exercise.id,
            }
            .into());
        }
        let cp = Self::recoverable(db)?.ok_or(AttemptError::NoAttemptInProgress)?;
        let exercise = db
            .get_exercise(cp.exercise_id)?
            .ok_or(DatabaseError::ExerciseNotFound(cp.exercise_id))?;
        let attempt = ActiveAttempt {
            exercise,
            timer: AttemptTimer::paused_with_elapsed(cp.elapsed_ms),
            started_at: cp.started_at,
            last_autosave_epoch_ms: now_ms(),
        };
        db.save_checkpoint(&attempt.checkpoint())?;
        self.active = Some(attempt);
        Ok(self.snapshot())
    }

    /// Drop the interrupted attempt without recording anything.
    ///
    /// # Errors
    /// Returns the store error if the checkpoint cannot be deleted.
    pub fn discard_recovered(db: &Database) -> Result<()> {
        db.clear_checkpoint()?;
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn active_mut(&mut self) -> Result<&mut ActiveAttempt, CoreError> {
        self.active
            .as_mut()
            .ok_or_else(|| AttemptError::NoAttemptInProgress.into())
    }

    /// Write the checkpoint; on success refresh the autosave clock.
    fn try_autosave(db: &Database, active: &mut ActiveAttempt) -> bool {
        match db.save_checkpoint(&active.checkpoint()) {
            Ok(()) => {
                active.last_autosave_epoch_ms = now_ms();
                true
            }
            Err(_) => false,
        }
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
