//! SQLite-backed user-record store.
//!
//! One row per user. Saves are version-checked: the UPDATE only applies
//! when the row still carries the version the caller loaded, so an
//! interleaved writer turns into `StoreError::Stale` instead of a silent
//! overwrite.

use chrono::{DateTime, NaiveTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{data_dir, UserRecordStore};
use crate::error::StoreError;
use crate::state::ReminderState;

const TIME_FMT: &str = "%H:%M:%S%.f";

pub struct SqliteUserStore {
    conn: Connection,
}

impl SqliteUserStore {
    /// Open the store at `~/.config/hydropace/hydropace.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let path = data_dir()
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))?
            .join("hydropace.db");
        let conn = Connection::open(&path)
            .map_err(|source| StoreError::OpenFailed { path, source })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::from)?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS reminder_state (
                    user_id                  INTEGER PRIMARY KEY,
                    daily_goal_ml            INTEGER NOT NULL,
                    consumed_today_ml        INTEGER NOT NULL DEFAULT 0,
                    dose_ml                  INTEGER NOT NULL,
                    window_start             TEXT NOT NULL,
                    window_end               TEXT NOT NULL,
                    minimum_interval_seconds REAL NOT NULL,
                    default_postpone_seconds REAL NOT NULL,
                    reminder_text            TEXT NOT NULL,
                    utc_offset_minutes       INTEGER NOT NULL DEFAULT 0,
                    next_reminder_at         TEXT,
                    last_reminder_sent_at    TEXT,
                    is_initialized           INTEGER NOT NULL DEFAULT 0,
                    version                  INTEGER NOT NULL DEFAULT 0
                );

                CREATE INDEX IF NOT EXISTS idx_reminder_state_initialized
                    ON reminder_state(is_initialized);",
            )
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))
    }

    fn row_to_state(row: &Row<'_>) -> rusqlite::Result<ReminderState> {
        let parse_time = |idx: usize| -> rusqlite::Result<NaiveTime> {
            let text: String = row.get(idx)?;
            NaiveTime::parse_from_str(&text, TIME_FMT).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
        };
        let next_reminder_at: Option<String> = row.get(10)?;
        let next_reminder_at = next_reminder_at
            .map(|text| {
                NaiveTime::parse_from_str(&text, TIME_FMT).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        10,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })
            })
            .transpose()?;
        let last_sent: Option<String> = row.get(11)?;
        let last_reminder_sent_at = last_sent
            .map(|text| {
                DateTime::parse_from_rfc3339(&text)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            11,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })
            })
            .transpose()?;

        Ok(ReminderState {
            user_id: row.get(0)?,
            daily_goal_ml: row.get(1)?,
            consumed_today_ml: row.get(2)?,
            dose_ml: row.get(3)?,
            window_start: parse_time(4)?,
            window_end: parse_time(5)?,
            minimum_interval_seconds: row.get(6)?,
            default_postpone_seconds: row.get(7)?,
            reminder_text: row.get(8)?,
            utc_offset_minutes: row.get(9)?,
            next_reminder_at,
            last_reminder_sent_at,
            is_initialized: row.get(12)?,
            version: row.get(13)?,
        })
    }
}

impl UserRecordStore for SqliteUserStore {
    fn load(&self, user_id: i64) -> Result<ReminderState, StoreError> {
        self.conn
            .query_row(
                "SELECT user_id, daily_goal_ml, consumed_today_ml, dose_ml,
                        window_start, window_end, minimum_interval_seconds,
                        default_postpone_seconds, reminder_text, utc_offset_minutes,
                        next_reminder_at, last_reminder_sent_at, is_initialized, version
                 FROM reminder_state WHERE user_id = ?1",
                params![user_id],
                Self::row_to_state,
            )
            .optional()?
            .ok_or(StoreError::NotFound { user_id })
    }

    fn save(&self, state: &ReminderState) -> Result<ReminderState, StoreError> {
        let window_start = state.window_start.format(TIME_FMT).to_string();
        let window_end = state.window_end.format(TIME_FMT).to_string();
        let next_reminder_at = state
            .next_reminder_at
            .map(|t| t.format(TIME_FMT).to_string());
        let last_sent = state.last_reminder_sent_at.map(|dt| dt.to_rfc3339());

        let updated = self.conn.execute(
            "UPDATE reminder_state SET
                daily_goal_ml = ?2, consumed_today_ml = ?3, dose_ml = ?4,
                window_start = ?5, window_end = ?6, minimum_interval_seconds = ?7,
                default_postpone_seconds = ?8, reminder_text = ?9,
                utc_offset_minutes = ?10, next_reminder_at = ?11,
                last_reminder_sent_at = ?12, is_initialized = ?13,
                version = version + 1
             WHERE user_id = ?1 AND version = ?14",
            params![
                state.user_id,
                state.daily_goal_ml,
                state.consumed_today_ml,
                state.dose_ml,
                window_start,
                window_end,
                state.minimum_interval_seconds,
                state.default_postpone_seconds,
                state.reminder_text,
                state.utc_offset_minutes,
                next_reminder_at,
                last_sent,
                state.is_initialized,
                state.version,
            ],
        )?;

        if updated == 0 {
            let exists: bool = self.conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM reminder_state WHERE user_id = ?1)",
                params![state.user_id],
                |row| row.get(0),
            )?;
            if exists {
                return Err(StoreError::Stale {
                    user_id: state.user_id,
                });
            }
            self.conn.execute(
                "INSERT INTO reminder_state (
                    user_id, daily_goal_ml, consumed_today_ml, dose_ml,
                    window_start, window_end, minimum_interval_seconds,
                    default_postpone_seconds, reminder_text, utc_offset_minutes,
                    next_reminder_at, last_reminder_sent_at, is_initialized, version
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 1)",
                params![
                    state.user_id,
                    state.daily_goal_ml,
                    state.consumed_today_ml,
                    state.dose_ml,
                    window_start,
                    window_end,
                    state.minimum_interval_seconds,
                    state.default_postpone_seconds,
                    state.reminder_text,
                    state.utc_offset_minutes,
                    next_reminder_at,
                    last_sent,
                    state.is_initialized,
                ],
            )?;
        }

        let mut stored = state.clone();
        stored.version = state.version + 1;
        Ok(stored)
    }

    fn delete(&self, user_id: i64) -> Result<(), StoreError> {
        self.conn.execute(
            "DELETE FROM reminder_state WHERE user_id = ?1",
            params![user_id],
        )?;
        Ok(())
    }

    fn list_initialized(&self) -> Result<Vec<i64>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_id FROM reminder_state WHERE is_initialized = 1 ORDER BY user_id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }
}
