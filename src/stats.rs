use chrono::{DateTime, Local};
use rusqlite::{params, Connection, Result};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::PersistError;
use crate::exercise::{Difficulty, Exercise, Subject};
use crate::summary::accuracy;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS exercises (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        subject TEXT NOT NULL,
        difficulty TEXT NOT NULL,
        question TEXT NOT NULL,
        options TEXT NOT NULL,
        correct_answer TEXT NOT NULL,
        explanation TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE IF NOT EXISTS exercise_attempts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        exercise_id INTEGER NOT NULL REFERENCES exercises(id),
        user_answer TEXT NOT NULL,
        is_correct BOOLEAN NOT NULL,
        time_spent_seconds INTEGER NOT NULL,
        timestamp TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_exercises_subject ON exercises(subject);
    CREATE INDEX IF NOT EXISTS idx_attempts_timestamp ON exercise_attempts(timestamp);
"#;

/// One submitted answer, as handed to the persistence collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub subject: Subject,
    pub difficulty: Difficulty,
    pub exercise: Exercise,
    pub user_answer: String,
    pub is_correct: bool,
    pub time_spent_secs: u64,
    pub timestamp: DateTime<Local>,
}

/// Sink for attempt records. Failures are reported, never retried.
pub trait AttemptRecorder: Send {
    fn record(&mut self, attempt: &AttemptRecord) -> std::result::Result<(), PersistError>;
}

/// Drops every record. Used with `--no-persist` or when the database is unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRecorder;

impl AttemptRecorder for NullRecorder {
    fn record(&mut self, _attempt: &AttemptRecord) -> std::result::Result<(), PersistError> {
        Ok(())
    }
}

/// SQLite store for exercises and attempts
#[derive(Debug)]
pub struct AttemptDb {
    conn: Connection,
}

impl AttemptDb {
    /// Open the database at the default state location
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("mathdrill_attempts.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        Self::with_connection(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(AttemptDb { conn })
    }

    /// Store the exercise and the attempt referencing it in one transaction
    pub fn record_attempt(&mut self, attempt: &AttemptRecord) -> std::result::Result<i64, PersistError> {
        let options = serde_json::to_string(&attempt.exercise.options)?;
        let tx = self.conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO exercises
            (subject, difficulty, question, options, correct_answer, explanation)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                attempt.subject.to_string(),
                attempt.difficulty.to_string(),
                attempt.exercise.question,
                options,
                attempt.exercise.correct_answer,
                attempt.exercise.explanation,
            ],
        )?;
        let exercise_id = tx.last_insert_rowid();

        tx.execute(
            r#"
            INSERT INTO exercise_attempts
            (exercise_id, user_answer, is_correct, time_spent_seconds, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                exercise_id,
                attempt.user_answer,
                attempt.is_correct,
                attempt.time_spent_secs as i64,
                attempt.timestamp.to_rfc3339(),
            ],
        )?;
        let attempt_id = tx.last_insert_rowid();

        tx.commit()?;
        Ok(attempt_id)
    }

    pub fn attempt_count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM exercise_attempts", [], |row| row.get(0))
    }

    /// `(attempts, correct)` across all difficulties of a subject
    pub fn subject_summary(&self, subject: Subject) -> Result<(i64, i64)> {
        self.conn.query_row(
            r#"
            SELECT
                COUNT(a.id),
                COALESCE(SUM(CASE WHEN a.is_correct = 1 THEN 1 ELSE 0 END), 0)
            FROM exercise_attempts a
            JOIN exercises e ON e.id = a.exercise_id
            WHERE e.subject = ?1
            "#,
            [subject.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
    }

    /// Average seconds spent per attempt, per difficulty of a subject
    pub fn average_time_by_difficulty(&self, subject: Subject) -> Result<Vec<(String, f64)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT e.difficulty, AVG(a.time_spent_seconds)
            FROM exercise_attempts a
            JOIN exercises e ON e.id = a.exercise_id
            WHERE e.subject = ?1
            GROUP BY e.difficulty
            ORDER BY e.difficulty
            "#,
        )?;

        let rows = stmt.query_map([subject.to_string()], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect()
    }

    /// Clear all attempts and exercises
    pub fn clear_all(&self) -> Result<()> {
        self.conn
            .execute_batch("DELETE FROM exercise_attempts; DELETE FROM exercises;")
    }

    /// Plain-text overview of every subject with recorded attempts
    pub fn report(&self) -> Result<String> {
        let mut lines = Vec::new();
        for subject in Subject::ALL {
            let (attempts, correct) = self.subject_summary(subject)?;
            if attempts == 0 {
                continue;
            }
            let times = self
                .average_time_by_difficulty(subject)?
                .into_iter()
                .map(|(difficulty, secs)| format!("{difficulty} {secs:.1}s"))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!(
                "{:<13} {:>3}/{:<4} {:>3}%   avg {}",
                subject.name(),
                correct,
                attempts,
                accuracy(correct as u32, attempts as u32),
                times
            ));
        }

        if lines.is_empty() {
            return Ok("No attempts recorded yet.".to_string());
        }
        Ok(lines.join("\n"))
    }
}

impl AttemptRecorder for AttemptDb {
    fn record(&mut self, attempt: &AttemptRecord) -> std::result::Result<(), PersistError> {
        self.record_attempt(attempt).map(|_| ())
    }
}
