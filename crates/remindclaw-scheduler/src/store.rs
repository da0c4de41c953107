//! Store contract plus an in-memory implementation.
//! The in-memory store backs tests and ephemeral runs; production uses the
//! SQLite store in `persistence`.

use std::collections::HashMap;
use std::sync::Mutex;

use remindclaw_core::error::{RemindClawError, Result};

use crate::reminder::{fresh_id, NewReminder, Reminder};

/// Durable reminder storage. Each call is atomic on its own; the engine
/// needs no cross-record transactions.
pub trait ReminderStore: Send + Sync {
    /// Persist a new reminder and return its assigned id.
    fn insert(&self, new: NewReminder) -> Result<String>;

    /// Look up a reminder by id.
    fn find_one(&self, id: &str) -> Result<Option<Reminder>>;

    /// All reminders for one channel, soonest first.
    fn for_channel(&self, channel: &str) -> Result<Vec<Reminder>>;

    /// Every stored reminder. Used by recovery.
    fn all(&self) -> Result<Vec<Reminder>>;

    /// Full replace by id.
    fn save(&self, reminder: &Reminder) -> Result<()>;

    /// Delete by id. Deleting an absent id is not an error.
    fn remove(&self, id: &str) -> Result<()>;
}

/// In-memory reminder store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Reminder>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Reminder>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ReminderStore for MemoryStore {
    fn insert(&self, new: NewReminder) -> Result<String> {
        let id = fresh_id();
        self.lock().insert(id.clone(), new.into_reminder(id.clone()));
        Ok(id)
    }

    fn find_one(&self, id: &str) -> Result<Option<Reminder>> {
        Ok(self.lock().get(id).cloned())
    }

    fn for_channel(&self, channel: &str) -> Result<Vec<Reminder>> {
        let mut records: Vec<Reminder> = self
            .lock()
            .values()
            .filter(|r| r.channel == channel)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.when);
        Ok(records)
    }

    fn all(&self) -> Result<Vec<Reminder>> {
        let mut records: Vec<Reminder> = self.lock().values().cloned().collect();
        records.sort_by_key(|r| r.when);
        Ok(records)
    }

    fn save(&self, reminder: &Reminder) -> Result<()> {
        let mut records = self.lock();
        if !records.contains_key(&reminder.id) {
            return Err(RemindClawError::Store(format!(
                "save of unknown reminder '{}'",
                reminder.id
            )));
        }
        records.insert(reminder.id.clone(), reminder.clone());
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<()> {
        self.lock().remove(id);
        Ok(())
    }
}
