//! SQLite-based attempt store and reporting queries.
//!
//! Provides persistent storage for:
//! - The imported exercise catalog (exams, worksheets, exercises)
//! - The append-only attempt log
//! - The single-row in-progress checkpoint used for crash recovery

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::{data_dir, migrations};
use crate::catalog::{Exam, Exercise, ExerciseFilter};
use crate::error::DatabaseError;

/// Outcome of a finalized attempt. Abandoned rows exist only when the
/// `record_abandoned` config flag is set; they never count as repetitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Completed,
    Abandoned,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Completed => "completed",
            Outcome::Abandoned => "abandoned",
        }
    }

    fn parse(s: &str) -> Result<Self, DatabaseError> {
        match s {
            "completed" => Ok(Outcome::Completed),
            "abandoned" => Ok(Outcome::Abandoned),
            other => Err(DatabaseError::QueryFailed(format!(
                "unknown attempt outcome '{other}'"
            ))),
        }
    }
}

/// One row of the append-only attempt log. Never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: i64,
    pub exercise_id: i64,
    pub started_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
    pub duration_secs: u64,
    pub outcome: Outcome,
}

/// One selection candidate with its attempt history summary, fetched in a
/// single batch query over the whole filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub exercise: Exercise,
    /// Number of completed attempts (the repetition count).
    pub completed_attempts: u32,
    /// Duration of the most recent completed attempt, if any.
    pub last_duration_secs: Option<u64>,
}

impl Candidate {
    /// Seconds per point of the most recent completed attempt.
    pub fn time_per_point(&self) -> Option<f64> {
        self.last_duration_secs
            .map(|secs| secs as f64 / self.exercise.points as f64)
    }
}

/// Durable snapshot of the in-progress attempt, overwritten on every
/// autosave tick and deleted on finalize/cancel/discard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub exercise_id: i64,
    pub elapsed_ms: u64,
    pub running: bool,
    /// Epoch ms of the current running segment's start; `Some` iff `running`.
    pub last_resumed_epoch_ms: Option<u64>,
    pub started_at: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
}

/// Completed-attempt statistics for one exercise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseStats {
    pub exercise: Exercise,
    pub attempts: u32,
    pub avg_secs: f64,
    pub best_secs: u64,
    pub worst_secs: u64,
    pub last_secs: u64,
}

/// Aggregate statistics over every completed attempt matching a filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_exercises: u32,
    pub attempted_exercises: u32,
    pub total_attempts: u32,
    pub total_secs: u64,
    pub avg_secs: Option<f64>,
    pub avg_time_per_point: Option<f64>,
}

/// One point of the time-per-point history, ordered by recording time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimePerPointEntry {
    pub recorded_at: DateTime<Utc>,
    pub exercise_id: i64,
    pub exercise: String,
    pub points: u32,
    pub duration_secs: u64,
    pub time_per_point: f64,
}

/// SQLite database holding the catalog, the attempt log and the checkpoint.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/studydrill/studydrill.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let path = data_dir()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?
            .join("studydrill.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &std::path::Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for tests and dry runs).
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, DatabaseError> {
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(DatabaseError::from)?;
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // ── Catalog writes (importer / test fixture surface) ─────────────

    /// Insert an exam. The core never calls this outside import tooling.
    ///
    /// # Errors
    /// Returns an error if the insert fails (e.g. duplicate name).
    pub fn insert_exam(&self, name: &str, description: Option<&str>) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO exams (name, description, created_at) VALUES (?1, ?2, ?3)",
            params![name, description, Utc::now().to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert a worksheet under an exam.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn insert_worksheet(
        &self,
        exam_id: i64,
        semester: u32,
        sheet_number: u32,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO worksheets (exam_id, semester, sheet_number) VALUES (?1, ?2, ?3)",
            params![exam_id, semester, sheet_number],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert an exercise on a worksheet. `points` must be positive.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn insert_exercise(
        &self,
        worksheet_id: i64,
        label: &str,
        points: u32,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO exercises (worksheet_id, label, points) VALUES (?1, ?2, ?3)",
            params![worksheet_id, label, points],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    // ── Catalog reads ────────────────────────────────────────────────

    /// List all exams with worksheet/exercise counts.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_exams(&self) -> Result<Vec<Exam>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT e.id, e.name, e.description, e.created_at,
                    COUNT(DISTINCT w.id), COUNT(DISTINCT x.id)
             FROM exams e
             LEFT JOIN worksheets w ON e.id = w.exam_id
             LEFT JOIN exercises x ON w.id = x.worksheet_id
             GROUP BY e.id, e.name, e.description, e.created_at
             ORDER BY e.created_at",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, u32>(4)?,
                row.get::<_, u32>(5)?,
            ))
        })?;

        let mut exams = Vec::new();
        for row in rows {
            let (id, name, description, created_at, worksheet_count, exercise_count) = row?;
            exams.push(Exam {
                id,
                name,
                description,
                created_at: parse_timestamp(&created_at)?,
                worksheet_count,
                exercise_count,
            });
        }
        Ok(exams)
    }

    /// Fetch one exercise with its worksheet/exam identity.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn get_exercise(&self, exercise_id: i64) -> Result<Option<Exercise>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT x.id, w.exam_id, w.semester, w.sheet_number, x.label, x.points
                 FROM exercises x
                 JOIN worksheets w ON x.worksheet_id = w.id
                 WHERE x.id = ?1",
                params![exercise_id],
                |row| {
                    Ok(Exercise {
                        id: row.get(0)?,
                        exam_id: row.get(1)?,
                        semester: row.get(2)?,
                        sheet_number: row.get(3)?,
                        label: row.get(4)?,
                        points: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    // ── Selection engine read path ───────────────────────────────────

    /// Fetch every exercise matching the filter together with its completed
    /// attempt count and most recent completed duration, in one query.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn candidate_stats(
        &self,
        filter: &ExerciseFilter,
    ) -> Result<Vec<Candidate>, DatabaseError> {
        let mut sql = String::from(
            "SELECT x.id, w.exam_id, w.semester, w.sheet_number, x.label, x.points,
                    (SELECT COUNT(*) FROM attempts a
                      WHERE a.exercise_id = x.id AND a.outcome = 'completed'),
                    (SELECT a.duration_secs FROM attempts a
                      WHERE a.exercise_id = x.id AND a.outcome = 'completed'
                      ORDER BY a.recorded_at DESC, a.id DESC LIMIT 1)
             FROM exercises x
             JOIN worksheets w ON x.worksheet_id = w.id
             WHERE x.points >= ?1 AND x.points <= ?2",
        );
        let mut bind: Vec<i64> = vec![
            i64::from(filter.range.min()),
            i64::from(filter.range.max()),
        ];
        if let Some(exam_id) = filter.exam_id {
            sql.push_str(" AND w.exam_id = ?3");
            bind.push(exam_id);
        }
        sql.push_str(" ORDER BY x.id");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bind), |row| {
            Ok(Candidate {
                exercise: Exercise {
                    id: row.get(0)?,
                    exam_id: row.get(1)?,
                    semester: row.get(2)?,
                    sheet_number: row.get(3)?,
                    label: row.get(4)?,
                    points: row.get(5)?,
                },
                completed_attempts: row.get(6)?,
                last_duration_secs: row.get(7)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Attempt log ──────────────────────────────────────────────────

    /// Append one attempt record. Single atomic insert; historical rows are
    /// never updated.
    ///
    /// # Errors
    /// Returns `ExerciseNotFound` for an unknown exercise id, or the
    /// underlying query error.
    pub fn record_attempt(
        &self,
        exercise_id: i64,
        started_at: DateTime<Utc>,
        duration_secs: u64,
        outcome: Outcome,
    ) -> Result<i64, DatabaseError> {
        if self.get_exercise(exercise_id)?.is_none() {
            return Err(DatabaseError::ExerciseNotFound(exercise_id));
        }
        self.conn.execute(
            "INSERT INTO attempts (exercise_id, started_at, recorded_at, duration_secs, outcome)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                exercise_id,
                started_at.to_rfc3339(),
                Utc::now().to_rfc3339(),
                duration_secs,
                outcome.as_str(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All attempt rows for one exercise, most recent first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn attempts_for_exercise(
        &self,
        exercise_id: i64,
    ) -> Result<Vec<AttemptRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, exercise_id, started_at, recorded_at, duration_secs, outcome
             FROM attempts
             WHERE exercise_id = ?1
             ORDER BY recorded_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![exercise_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, u64>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, exercise_id, started_at, recorded_at, duration_secs, outcome) = row?;
            records.push(AttemptRecord {
                id,
                exercise_id,
                started_at: parse_timestamp(&started_at)?,
                recorded_at: parse_timestamp(&recorded_at)?,
                duration_secs,
                outcome: Outcome::parse(&outcome)?,
            });
        }
        Ok(records)
    }

    // ── Checkpoint (crash recovery) ──────────────────────────────────

    /// Overwrite the single checkpoint slot. One `INSERT OR REPLACE`
    /// statement, atomic under SQLite journaling, so a crash mid-write never
    /// leaves a partial row behind.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn save_checkpoint(&self, cp: &Checkpoint) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO checkpoint
                 (slot, exercise_id, elapsed_ms, running, last_resumed_epoch_ms,
                  started_at, saved_at)
             VALUES (0, ?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                cp.exercise_id,
                cp.elapsed_ms,
                cp.running,
                cp.last_resumed_epoch_ms,
                cp.started_at.to_rfc3339(),
                cp.saved_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Read back the checkpoint slot, if any.
    ///
    /// # Errors
    /// Returns `CorruptCheckpoint` if the stored row cannot be decoded; the
    /// caller decides whether to clear it.
    pub fn load_checkpoint(&self) -> Result<Option<Checkpoint>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT exercise_id, elapsed_ms, running, last_resumed_epoch_ms,
                        started_at, saved_at
                 FROM checkpoint WHERE slot = 0",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, u64>(1)?,
                        row.get::<_, bool>(2)?,
                        row.get::<_, Option<u64>>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((exercise_id, elapsed_ms, running, last_resumed_epoch_ms, started_at, saved_at)) =
            row
        else {
            return Ok(None);
        };

        let decode = |s: &str| {
            DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| DatabaseError::CorruptCheckpoint(e.to_string()))
        };
        if running && last_resumed_epoch_ms.is_none() {
            return Err(DatabaseError::CorruptCheckpoint(
                "running checkpoint without a segment start".into(),
            ));
        }
        Ok(Some(Checkpoint {
            exercise_id,
            elapsed_ms,
            running,
            last_resumed_epoch_ms,
            started_at: decode(&started_at)?,
            saved_at: decode(&saved_at)?,
        }))
    }

    /// Delete the checkpoint slot. A no-op when none exists.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub fn clear_checkpoint(&self) -> Result<(), DatabaseError> {
        self.conn.execute("DELETE FROM checkpoint WHERE slot = 0", [])?;
        Ok(())
    }

    // ── Reporting queries ────────────────────────────────────────────

    /// Completed-attempt statistics for one exercise, `None` when it has no
    /// completed attempts.
    ///
    /// # Errors
    /// Returns `ExerciseNotFound` for an unknown id, or the query error.
    pub fn exercise_stats(
        &self,
        exercise_id: i64,
    ) -> Result<Option<ExerciseStats>, DatabaseError> {
        let Some(exercise) = self.get_exercise(exercise_id)? else {
            return Err(DatabaseError::ExerciseNotFound(exercise_id));
        };
        let row = self
            .conn
            .query_row(
                "SELECT COUNT(*), AVG(duration_secs), MIN(duration_secs), MAX(duration_secs)
                 FROM attempts
                 WHERE exercise_id = ?1 AND outcome = 'completed'",
                params![exercise_id],
                |row| {
                    Ok((
                        row.get::<_, u32>(0)?,
                        row.get::<_, Option<f64>>(1)?,
                        row.get::<_, Option<u64>>(2)?,
                        row.get::<_, Option<u64>>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((attempts, avg, best, worst)) = row else {
            return Ok(None);
        };
        if attempts == 0 {
            return Ok(None);
        }
        let last_secs = self
            .conn
            .query_row(
                "SELECT duration_secs FROM attempts
                 WHERE exercise_id = ?1 AND outcome = 'completed'
                 ORDER BY recorded_at DESC, id DESC LIMIT 1",
                params![exercise_id],
                |row| row.get::<_, u64>(0),
            )?;
        Ok(Some(ExerciseStats {
            exercise,
            attempts,
            avg_secs: avg.unwrap_or(0.0),
            best_secs: best.unwrap_or(0),
            worst_secs: worst.unwrap_or(0),
            last_secs,
        }))
    }

    /// Aggregate statistics over every completed attempt matching the filter.
    ///
    /// # Errors
    /// Returns an error if a query fails.
    pub fn aggregate_stats(
        &self,
        filter: &ExerciseFilter,
    ) -> Result<AggregateStats, DatabaseError> {
        let candidates = self.candidate_stats(filter)?;
        let total_exercises = candidates.len() as u32;
        let attempted_exercises =
            candidates.iter().filter(|c| c.completed_attempts > 0).count() as u32;

        let mut sql = String::from(
            "SELECT COUNT(*), COALESCE(SUM(a.duration_secs), 0),
                    AVG(a.duration_secs),
                    AVG(CAST(a.duration_secs AS FLOAT) / x.points)
             FROM attempts a
             JOIN exercises x ON a.exercise_id = x.id
             JOIN worksheets w ON x.worksheet_id = w.id
             WHERE a.outcome = 'completed'
               AND x.points >= ?1 AND x.points <= ?2",
        );
        let mut bind: Vec<i64> = vec![
            i64::from(filter.range.min()),
            i64::from(filter.range.max()),
        ];
        if let Some(exam_id) = filter.exam_id {
            sql.push_str(" AND w.exam_id = ?3");
            bind.push(exam_id);
        }

        let (total_attempts, total_secs, avg_secs, avg_tpp) = self.conn.query_row(
            &sql,
            params_from_iter(bind),
            |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, u64>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                ))
            },
        )?;

        Ok(AggregateStats {
            total_exercises,
            attempted_exercises,
            total_attempts,
            total_secs,
            avg_secs,
            avg_time_per_point: avg_tpp,
        })
    }

    /// Completed attempts as a time-per-point series, oldest first,
    /// optionally scoped to one exam.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn time_per_point_series(
        &self,
        exam_id: Option<i64>,
    ) -> Result<Vec<TimePerPointEntry>, DatabaseError> {
        let mut sql = String::from(
            "SELECT a.recorded_at, x.id, w.semester, w.sheet_number, x.label, x.points,
                    a.duration_secs,
                    CAST(a.duration_secs AS FLOAT) / x.points
             FROM attempts a
             JOIN exercises x ON a.exercise_id = x.id
             JOIN worksheets w ON x.worksheet_id = w.id
             WHERE a.outcome = 'completed'",
        );
        let mut bind: Vec<i64> = Vec::new();
        if let Some(exam_id) = exam_id {
            sql.push_str(" AND w.exam_id = ?1");
            bind.push(exam_id);
        }
        sql.push_str(" ORDER BY a.recorded_at, a.id");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bind), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, u32>(5)?,
                row.get::<_, u64>(6)?,
                row.get::<_, f64>(7)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (recorded_at, id, semester, sheet, label, points, duration_secs, tpp) = row?;
            entries.push(TimePerPointEntry {
                recorded_at: parse_timestamp(&recorded_at)?,
                exercise_id: id,
                exercise: format!("Sem{semester} Sheet{sheet} Ex{label}"),
                points,
                duration_secs,
                time_per_point: tpp,
            });
        }
        Ok(entries)
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DatabaseError::QueryFailed(format!("bad timestamp '{s}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ScoreRange;

    fn seeded() -> (Database, i64, i64, i64) {
        let db = Database::open_memory().unwrap();
        let exam = db.insert_exam("Mechanics", Some("first semester")).unwrap();
        let sheet = db.insert_worksheet(exam, 1, 1).unwrap();
        let a = db.insert_exercise(sheet, "1a", 10).unwrap();
        let b = db.insert_exercise(sheet, "1b", 5).unwrap();
        (db, exam, a, b)
    }

    fn filter(min: u32, max: u32) -> ExerciseFilter {
        ExerciseFilter::new(ScoreRange::new(min, max).unwrap())
    }

    #[test]
    fn record_and_count_attempts() {
        let (db, _, a, b) = seeded();
        db.record_attempt(a, Utc::now(), 100, Outcome::Completed)
            .unwrap();
        db.record_attempt(a, Utc::now(), 90, Outcome::Completed)
            .unwrap();

        let candidates = db.candidate_stats(&filter(0, 20)).unwrap();
        assert_eq!(candidates.len(), 2);
        let ca = candidates.iter().find(|c| c.exercise.id == a).unwrap();
        let cb = candidates.iter().find(|c| c.exercise.id == b).unwrap();
        assert_eq!(ca.completed_attempts, 2);
        assert_eq!(ca.last_duration_secs, Some(90));
        assert_eq!(cb.completed_attempts, 0);
        assert_eq!(cb.last_duration_secs, None);
    }

    #[test]
    fn abandoned_attempts_do_not_count_as_repetitions() {
        let (db, _, a, _) = seeded();
        db.record_attempt(a, Utc::now(), 30, Outcome::Abandoned)
            .unwrap();
        let candidates = db.candidate_stats(&filter(0, 20)).unwrap();
        let ca = candidates.iter().find(|c| c.exercise.id == a).unwrap();
        assert_eq!(ca.completed_attempts, 0);
        assert_eq!(ca.last_duration_secs, None);
    }

    #[test]
    fn unknown_exercise_is_rejected() {
        let (db, _, _, _) = seeded();
        let err = db
            .record_attempt(9999, Utc::now(), 10, Outcome::Completed)
            .unwrap_err();
        assert!(matches!(err, DatabaseError::ExerciseNotFound(9999)));
    }

    #[test]
    fn exam_scope_narrows_candidates() {
        let (db, exam, _, _) = seeded();
        let other = db.insert_exam("Optics", None).unwrap();
        let sheet = db.insert_worksheet(other, 2, 1).unwrap();
        db.insert_exercise(sheet, "3", 8).unwrap();

        let all = db.candidate_stats(&filter(0, 20)).unwrap();
        assert_eq!(all.len(), 3);
        let scoped = db
            .candidate_stats(&ExerciseFilter::for_exam(
                ScoreRange::new(0, 20).unwrap(),
                exam,
            ))
            .unwrap();
        assert_eq!(scoped.len(), 2);
    }

    #[test]
    fn checkpoint_round_trip() {
        let (db, _, a, _) = seeded();
        assert!(db.load_checkpoint().unwrap().is_none());

        let cp = Checkpoint {
            exercise_id: a,
            elapsed_ms: 12_345,
            running: false,
            last_resumed_epoch_ms: None,
            started_at: Utc::now(),
            saved_at: Utc::now(),
        };
        db.save_checkpoint(&cp).unwrap();
        let loaded = db.load_checkpoint().unwrap().unwrap();
        assert_eq!(loaded.exercise_id, a);
        assert_eq!(loaded.elapsed_ms, 12_345);
        assert!(!loaded.running);

        // Overwrite, then clear.
        db.save_checkpoint(&Checkpoint {
            elapsed_ms: 20_000,
            ..cp
        })
        .unwrap();
        assert_eq!(db.load_checkpoint().unwrap().unwrap().elapsed_ms, 20_000);
        db.clear_checkpoint().unwrap();
        assert!(db.load_checkpoint().unwrap().is_none());
    }

    #[test]
    fn corrupt_checkpoint_is_not_read_back_as_valid() {
        let (db, _, a, _) = seeded();
        db.conn()
            .execute(
                "INSERT OR REPLACE INTO checkpoint
                     (slot, exercise_id, elapsed_ms, running, last_resumed_epoch_ms,
                      started_at, saved_at)
                 VALUES (0, ?1, 100, 0, NULL, 'not-a-timestamp', 'also-bad')",
                params![a],
            )
            .unwrap();
        let err = db.load_checkpoint().unwrap_err();
        assert!(matches!(err, DatabaseError::CorruptCheckpoint(_)));
    }

    #[test]
    fn exercise_stats_summarize_completed_attempts() {
        let (db, _, a, _) = seeded();
        assert!(db.exercise_stats(a).unwrap().is_none());
        for secs in [120, 80, 100] {
            db.record_attempt(a, Utc::now(), secs, Outcome::Completed)
                .unwrap();
        }
        let stats = db.exercise_stats(a).unwrap().unwrap();
        assert_eq!(stats.attempts, 3);
        assert_eq!(stats.best_secs, 80);
        assert_eq!(stats.worst_secs, 120);
        assert_eq!(stats.last_secs, 100);
        assert!((stats.avg_secs - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn aggregate_stats_cover_the_filter() {
        let (db, _, a, b) = seeded();
        db.record_attempt(a, Utc::now(), 100, Outcome::Completed)
            .unwrap();
        db.record_attempt(b, Utc::now(), 60, Outcome::Completed)
            .unwrap();

        let stats = db.aggregate_stats(&filter(0, 20)).unwrap();
        assert_eq!(stats.total_exercises, 2);
        assert_eq!(stats.attempted_exercises, 2);
        assert_eq!(stats.total_attempts, 2);
        assert_eq!(stats.total_secs, 160);
        // a: 100/10 = 10.0 s/pt, b: 60/5 = 12.0 s/pt
        assert!((stats.avg_time_per_point.unwrap() - 11.0).abs() < 1e-9);
    }

    #[test]
    fn time_per_point_series_is_ordered() {
        let (db, _, a, b) = seeded();
        db.record_attempt(a, Utc::now(), 100, Outcome::Completed)
            .unwrap();
        db.record_attempt(b, Utc::now(), 60, Outcome::Completed)
            .unwrap();
        let series = db.time_per_point_series(None).unwrap();
        assert_eq!(series.len(), 2);
        assert!(series[0].recorded_at <= series[1].recorded_at);
        assert!((series[1].time_per_point - 12.0).abs() < 1e-9);
    }

    #[test]
    fn list_exams_reports_counts() {
        let (db, exam, _, _) = seeded();
        let exams = db.list_exams().unwrap();
        assert_eq!(exams.len(), 1);
        assert_eq!(exams[0].id, exam);
        assert_eq!(exams[0].worksheet_count, 1);
        assert_eq!(exams[0].exercise_count, 2);
    }
}
