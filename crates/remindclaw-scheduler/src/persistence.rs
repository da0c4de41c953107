//! SQLite-backed reminder persistence. Survives restarts; recovery rebuilds
//! timers from this store at process start.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use remindclaw_core::error::{RemindClawError, Result};
use rusqlite::Connection;

use crate::reminder::{fresh_id, NewReminder, Reminder};
use crate::store::ReminderStore;

/// SQLite reminder store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the reminder database.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| RemindClawError::Store(format!("DB open: {e}")))?;
        let store = Self { conn: Mutex::new(conn) };
        store.migrate()?;
        Ok(store)
    }

    /// In-memory database, handy for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| RemindClawError::Store(format!("DB open: {e}")))?;
        let store = Self { conn: Mutex::new(conn) };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        self.lock()
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS reminders (
                id TEXT PRIMARY KEY,
                channel TEXT NOT NULL,
                message TEXT NOT NULL,
                due_at TEXT NOT NULL,        -- rfc3339, always UTC
                repeat_days TEXT             -- JSON array of weekday codes, NULL = one-shot
            );
            CREATE INDEX IF NOT EXISTS idx_reminders_channel ON reminders(channel);
         ",
            )
            .map_err(|e| RemindClawError::Store(format!("Migration: {e}")))?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Decode one row, or None (with a warning) if the record is malformed.
    /// A single bad record must never abort a recovery scan.
    fn decode_row(id: String, channel: String, message: String, due_at: String, repeat_days: Option<String>) -> Option<Reminder> {
        let when = match DateTime::parse_from_rfc3339(&due_at) {
            Ok(t) => t.with_timezone(&Utc),
            Err(e) => {
                tracing::warn!("⚠️ Skipping reminder '{id}': bad due_at '{due_at}': {e}");
                return None;
            }
        };
        let repeat = match repeat_days {
            Some(json) => match serde_json::from_str::<Vec<u8>>(&json) {
                Ok(days) => Some(days),
                Err(e) => {
                    tracing::warn!("⚠️ Skipping reminder '{id}': bad repeat_days '{json}': {e}");
                    return None;
                }
            },
            None => None,
        };
        Some(Reminder { id, channel, message, when, repeat })
    }

    fn query(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Reminder>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| RemindClawError::Store(format!("Query: {e}")))?;
        let rows = stmt
            .query_map(params, |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })
            .map_err(|e| RemindClawError::Store(format!("Query: {e}")))?;
        Ok(rows
            .filter_map(|r| r.ok())
            .filter_map(|(id, channel, message, due_at, repeat)| {
                Self::decode_row(id, channel, message, due_at, repeat)
            })
            .collect())
    }
}

const SELECT_FIELDS: &str = "id, channel, message, due_at, repeat_days";

impl ReminderStore for SqliteStore {
    fn insert(&self, new: NewReminder) -> Result<String> {
        let id = fresh_id();
        let repeat_json = new
            .repeat
            .as_ref()
            .map(|days| serde_json::to_string(days).unwrap_or_else(|_| "[]".into()));
        self.lock()
            .execute(
                "INSERT INTO reminders (id, channel, message, due_at, repeat_days)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, new.channel, new.message, new.when.to_rfc3339(), repeat_json],
            )
            .map_err(|e| RemindClawError::Store(format!("Insert: {e}")))?;
        Ok(id)
    }

    fn find_one(&self, id: &str) -> Result<Option<Reminder>> {
        let mut records = self.query(
            &format!("SELECT {SELECT_FIELDS} FROM reminders WHERE id = ?1"),
            &[&id],
        )?;
        Ok(records.pop())
    }

    fn for_channel(&self, channel: &str) -> Result<Vec<Reminder>> {
        self.query(
            &format!("SELECT {SELECT_FIELDS} FROM reminders WHERE channel = ?1 ORDER BY due_at"),
            &[&channel],
        )
    }

    fn all(&self) -> Result<Vec<Reminder>> {
        self.query(&format!("SELECT {SELECT_FIELDS} FROM reminders ORDER BY due_at"), &[])
    }

    fn save(&self, reminder: &Reminder) -> Result<()> {
        let repeat_json = reminder
            .repeat
            .as_ref()
            .map(|days| serde_json::to_string(days).unwrap_or_else(|_| "[]".into()));
        self.lock()
            .execute(
                "INSERT OR REPLACE INTO reminders (id, channel, message, due_at, repeat_days)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    reminder.id,
                    reminder.channel,
                    reminder.message,
                    reminder.when.to_rfc3339(),
                    repeat_json
                ],
            )
            .map_err(|e| RemindClawError::Store(format!("Save: {e}")))?;
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<()> {
        self.lock()
            .execute("DELETE FROM reminders WHERE id = ?1", [id])
            .map_err(|e| RemindClawError::Store(format!("Delete: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn wednesday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2013, 12, 11, 13, 15, 0).unwrap()
    }

    #[test]
    fn test_open_and_migrate() {
        let dir = std::env::temp_dir().join("remindclaw-db-test");
        std::fs::create_dir_all(&dir).ok();
        let store = SqliteStore::open(&dir.join("test.db")).unwrap();
        assert!(store.all().unwrap().is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_roundtrip_with_repeat_and_unicode() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store
            .insert(NewReminder::repeating("☃", "snowman ☃ time", wednesday(), vec![0, 2, 4]))
            .unwrap();

        let rec = store.find_one(&id).unwrap().unwrap();
        assert_eq!(rec.channel, "☃");
        assert_eq!(rec.message, "snowman ☃ time");
        assert_eq!(rec.when, wednesday());
        assert_eq!(rec.repeat, Some(vec![0, 2, 4]));
    }

    #[test]
    fn test_save_advances_due_time() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store
            .insert(NewReminder::repeating("#bots", "standup", wednesday(), vec![0, 2, 4]))
            .unwrap();

        let mut rec = store.find_one(&id).unwrap().unwrap();
        rec.when = wednesday() + chrono::Duration::days(2);
        store.save(&rec).unwrap();

        assert_eq!(store.find_one(&id).unwrap().unwrap().when, rec.when);
        assert_eq!(store.all().unwrap().len(), 1);
    }

    #[test]
    fn test_remove_and_missing_lookup() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.insert(NewReminder::once("#bots", "once", wednesday())).unwrap();
        store.remove(&id).unwrap();
        store.remove(&id).unwrap();
        assert!(store.find_one(&id).unwrap().is_none());
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(NewReminder::once("#bots", "good", wednesday())).unwrap();
        {
            let conn = store.lock();
            conn.execute(
                "INSERT INTO reminders (id, channel, message, due_at, repeat_days)
                 VALUES ('deadbeef', '#bots', 'bad', 'not-a-timestamp', NULL)",
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO reminders (id, channel, message, due_at, repeat_days)
                 VALUES ('deadbee2', '#bots', 'bad days', ?1, 'oops')",
                [wednesday().to_rfc3339()],
            )
            .unwrap();
        }

        let records = store.all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "good");
    }
}
