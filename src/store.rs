use rusqlite::{params, Connection, Result};
use std::path::PathBuf;

use crate::app_dirs::AppDirs;
use crate::session::{SessionRecord, TrialRecord};

/// Persisted collection of session records. Validity is computed once by the
/// caller before `append`; readers never mutate stored records.
pub trait RecordStore {
    /// All records in insertion order.
    fn load_all(&self) -> Result<Vec<SessionRecord>>;
    fn append(&mut self, record: &SessionRecord) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// SQLite-backed record store. Trials are stored as a JSON text column since
/// they are only ever read back whole.
#[derive(Debug)]
pub struct SessionDb {
    conn: Connection,
}

impl SessionDb {
    /// Open (creating if needed) the database at the default state path.
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("skala_sessions.db"));

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        Self::with_connection(Connection::open(&db_path)?)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                participant_id TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                age TEXT,
                gender TEXT,
                attention_check_1 INTEGER,
                attention_check_2 INTEGER,
                open_question_1 TEXT,
                open_question_2 TEXT,
                trials TEXT NOT NULL,
                total_duration INTEGER NOT NULL,
                is_valid BOOLEAN NOT NULL,
                invalid_reason TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sessions_start_time ON sessions(start_time)",
            [],
        )?;

        Ok(SessionDb { conn })
    }
}

impl RecordStore for SessionDb {
    fn load_all(&self) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT participant_id, start_time, end_time, age, gender,
                   attention_check_1, attention_check_2,
                   open_question_1, open_question_2,
                   trials, total_duration, is_valid, invalid_reason
            FROM sessions
            ORDER BY id ASC
            "#,
        )?;

        let record_iter = stmt.query_map([], |row| {
            let trials_json: String = row.get(9)?;
            let trials: Vec<TrialRecord> = serde_json::from_str(&trials_json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    9,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

            Ok(SessionRecord {
                participant_id: row.get(0)?,
                start_time: row.get(1)?,
                end_time: row.get(2)?,
                age: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                gender: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                attention_check_1: row.get(5)?,
                attention_check_2: row.get(6)?,
                open_question_1: row.get(7)?,
                open_question_2: row.get(8)?,
                trials,
                total_duration: row.get(10)?,
                is_valid: row.get(11)?,
                invalid_reason: row.get(12)?,
            })
        })?;

        let mut records = Vec::new();
        for record in record_iter {
            records.push(record?);
        }

        Ok(records)
    }

    fn append(&mut self, record: &SessionRecord) -> Result<()> {
        let trials_json = serde_json::to_string(&record.trials)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        self.conn.execute(
            r#"
            INSERT INTO sessions
            (participant_id, start_time, end_time, age, gender,
             attention_check_1, attention_check_2,
             open_question_1, open_question_2,
             trials, total_duration, is_valid, invalid_reason)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                record.participant_id,
                record.start_time,
                record.end_time,
                record.age,
                record.gender,
                record.attention_check_1,
                record.attention_check_2,
                record.open_question_1,
                record.open_question_2,
                trials_json,
                record.total_duration,
                record.is_valid,
                record.invalid_reason,
            ],
        )?;

        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.conn.execute("DELETE FROM sessions", [])?;
        Ok(())
    }
}
