//! Pending set — reminder ids that currently have a timer armed.
//!
//! An id is in the set iff exactly one timer is outstanding for it. The
//! engine adds an id when it arms a timer; the fire path removes it when the
//! reminder is done (delivered one-shot, deleted record, or exhausted
//! recurrence) and keeps it while a recurring reminder rolls forward.
//! Recovery consults the set so a record that already has a live timer is
//! never armed twice.

use std::collections::HashSet;
use std::sync::Mutex;

/// Process-wide set of armed reminder ids.
#[derive(Debug, Default)]
pub struct PendingSet {
    ids: Mutex<HashSet<String>>,
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an id. Returns false if it was already present.
    pub fn insert(&self, id: &str) -> bool {
        self.lock().insert(id.to_string())
    }

    /// Remove an id if present.
    pub fn discard(&self, id: &str) {
        self.lock().remove(id);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        // A poisoned lock means a panic elsewhere; the set itself is still
        // consistent (plain inserts/removes), so keep going.
        self.ids.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_discard() {
        let pending = PendingSet::new();
        assert!(pending.insert("a"));
        assert!(!pending.insert("a"));
        assert!(pending.contains("a"));
        pending.discard("a");
        assert!(!pending.contains("a"));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_discard_absent_is_noop() {
        let pending = PendingSet::new();
        pending.discard("missing");
        assert_eq!(pending.len(), 0);
    }
}
