//! Database schema migrations for studydrill.
//!
//! Migrations are versioned and applied automatically when opening the
//! database. The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Apply all pending migrations to bring the database to the current schema
/// version.
///
/// # Errors
/// Returns an error if a migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }
    if current_version < 3 {
        migrate_v3(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Current schema version, 0 for an initial database.
fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or(0)
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// v1: exercise catalog and the append-only attempt log.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS exams (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL UNIQUE,
            description TEXT,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS worksheets (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            exam_id      INTEGER NOT NULL REFERENCES exams(id),
            semester     INTEGER NOT NULL,
            sheet_number INTEGER NOT NULL,
            UNIQUE(exam_id, semester, sheet_number)
        );

        CREATE TABLE IF NOT EXISTS exercises (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            worksheet_id INTEGER NOT NULL REFERENCES worksheets(id),
            label        TEXT NOT NULL,
            points       INTEGER NOT NULL CHECK (points > 0),
            UNIQUE(worksheet_id, label)
        );

        CREATE TABLE IF NOT EXISTS attempts (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            exercise_id   INTEGER NOT NULL REFERENCES exercises(id),
            started_at    TEXT NOT NULL,
            recorded_at   TEXT NOT NULL,
            duration_secs INTEGER NOT NULL CHECK (duration_secs >= 0),
            outcome       TEXT NOT NULL CHECK (outcome IN ('completed', 'abandoned'))
        );",
    )?;
    set_schema_version(conn, 1)
}

/// v2: single-row in-progress checkpoint for crash recovery.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS checkpoint (
            slot                  INTEGER PRIMARY KEY CHECK (slot = 0),
            exercise_id           INTEGER NOT NULL REFERENCES exercises(id),
            elapsed_ms            INTEGER NOT NULL,
            running               INTEGER NOT NULL,
            last_resumed_epoch_ms INTEGER,
            started_at            TEXT NOT NULL,
            saved_at              TEXT NOT NULL
        );",
    )?;
    set_schema_version(conn, 2)
}

/// v3: indexes for the batch read paths used by the selection engine.
fn migrate_v3(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_attempts_exercise_outcome
            ON attempts(exercise_id, outcome);
        CREATE INDEX IF NOT EXISTS idx_attempts_recorded_at
            ON attempts(recorded_at);
        CREATE INDEX IF NOT EXISTS idx_exercises_points
            ON exercises(points);",
    )?;
    set_schema_version(conn, 3)
}
