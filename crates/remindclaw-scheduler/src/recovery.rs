//! Startup reconciliation — rebuilds in-memory timers from the store.
//!
//! Timers live in process memory and die with it. On start, every stored
//! reminder without an armed timer gets one back: future one-shots pick up
//! their remaining delay, recently-missed ones fire immediately, stale ones
//! are dropped, and recurring ones are advanced past the missed occurrence.
//! The missed occurrence itself is not re-delivered.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use remindclaw_core::traits::Transport;

use crate::engine::ReminderEngine;
use crate::recur;

impl ReminderEngine {
    /// Run once when the process (re)starts. Safe to call again later: ids
    /// that already have a timer are skipped.
    pub async fn reconcile(&self, now: DateTime<Utc>, transport: &Arc<dyn Transport>) {
        let records = match self.store.all() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("⚠️ Recovery scan failed: {e}");
                return;
            }
        };
        tracing::info!("⏰ Recovery: examining {} stored reminder(s)", records.len());

        for record in records {
            if self.pending.contains(&record.id) {
                continue;
            }

            let Some(days) = record.repeat.clone() else {
                self.reconcile_one_shot(now, &record.id, record.when, transport);
                continue;
            };

            // Advance from the stored due time, not from now: the next
            // occurrence belongs to the recurrence grid, not to when the
            // process happened to come back.
            match recur::next_occurrence(record.when, &days) {
                Some((next_when, _)) => {
                    let mut record = record;
                    record.when = next_when;
                    if let Err(e) = self.store.save(&record) {
                        tracing::warn!("⚠️ Failed to persist recovered reminder '{}': {e}", record.id);
                    }
                    let delay = (next_when - now).num_seconds();
                    tracing::info!("🔁 Recovered recurring reminder '{}', due in {delay}s", record.id);
                    self.arm(&record.id, delay, transport);
                }
                None => {
                    tracing::info!("🛑 Recovered reminder '{}' has no next occurrence", record.id);
                    if self.delete_exhausted {
                        if let Err(e) = self.store.remove(&record.id) {
                            tracing::warn!("⚠️ Failed to remove exhausted reminder '{}': {e}", record.id);
                        }
                    }
                }
            }
        }
    }

    fn reconcile_one_shot(
        &self,
        now: DateTime<Utc>,
        id: &str,
        when: DateTime<Utc>,
        transport: &Arc<dyn Transport>,
    ) {
        let overdue = (now - when).num_seconds();
        if overdue < 0 {
            // Still in the future: arm the remaining delay.
            self.arm(id, -overdue, transport);
        } else if overdue < self.stale_after_secs {
            // Missed by less than the grace threshold: fire on the next tick.
            tracing::info!("⏰ Recovered late reminder '{id}' ({overdue}s overdue), firing now");
            self.arm(id, 0, transport);
        } else {
            // Missed by a day or more: relevance is gone, drop it.
            tracing::info!("🗑️ Dropping stale reminder '{id}' ({overdue}s overdue)");
            if let Err(e) = self.store.remove(id) {
                tracing::warn!("⚠️ Failed to remove stale reminder '{id}': {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::harness;
    use crate::reminder::NewReminder;
    use crate::store::ReminderStore;
    use chrono::TimeZone;
    use std::time::Duration;

    // 2013-12-13 was a Friday.
    fn friday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2013, 12, 13, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_already_pending_id_is_untouched() {
        let h = harness();
        let id = h
            .store
            .insert(NewReminder::repeating("#bots", "msg", friday(), vec![0, 2, 4]))
            .unwrap();
        h.engine.pending.insert(&id);

        h.engine.reconcile(friday(), &h.transport).await;

        assert!(h.timer.delays().is_empty());
        // The stored due time was not advanced either.
        assert_eq!(h.store.find_one(&id).unwrap().unwrap().when, friday());
    }

    #[tokio::test]
    async fn test_future_one_shot_gets_remaining_delay() {
        let h = harness();
        let id = h
            .store
            .insert(NewReminder::once("#bots", "msg", friday() + chrono::Duration::seconds(600)))
            .unwrap();

        h.engine.reconcile(friday(), &h.transport).await;

        assert_eq!(h.timer.delays(), vec![Duration::from_secs(600)]);
        assert!(h.engine.pending().contains(&id));
    }

    #[tokio::test]
    async fn test_due_now_one_shot_fires_immediately() {
        let h = harness();
        let id = h.store.insert(NewReminder::once("#bots", "msg", friday())).unwrap();

        h.engine.reconcile(friday(), &h.transport).await;

        assert_eq!(h.timer.delays(), vec![Duration::from_secs(0)]);
        assert!(h.engine.pending().contains(&id));
    }

    #[tokio::test]
    async fn test_slightly_late_one_shot_fires_immediately() {
        let h = harness();
        let id = h.store.insert(NewReminder::once("#bots", "msg", friday())).unwrap();

        h.engine
            .reconcile(friday() + chrono::Duration::seconds(60), &h.transport)
            .await;

        assert_eq!(h.timer.delays(), vec![Duration::from_secs(0)]);
        assert!(h.engine.pending().contains(&id));
    }

    #[tokio::test]
    async fn test_stale_one_shot_is_dropped() {
        for overdue_secs in [86_400, 86_400 + 1, 10 * 86_400] {
            let h = harness();
            let id = h.store.insert(NewReminder::once("#bots", "msg", friday())).unwrap();

            h.engine
                .reconcile(friday() + chrono::Duration::seconds(overdue_secs), &h.transport)
                .await;

            assert!(h.timer.delays().is_empty(), "{overdue_secs}");
            assert!(!h.engine.pending().contains(&id));
            assert!(h.store.find_one(&id).unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_full_week_repeat_overdue_reschedules_next_day() {
        let h = harness();
        let id = h
            .store
            .insert(NewReminder::repeating("#bots", "msg", friday(), (0..7).collect()))
            .unwrap();

        h.engine
            .reconcile(friday() + chrono::Duration::seconds(300), &h.transport)
            .await;

        // Missed occurrence rolls one day forward; the timer covers the rest.
        assert_eq!(h.timer.delays(), vec![Duration::from_secs(86_400 - 300)]);
        assert!(h.engine.pending().contains(&id));
        let rec = h.store.find_one(&id).unwrap().unwrap();
        assert_eq!(rec.when, friday() + chrono::Duration::days(1));
    }

    #[tokio::test]
    async fn test_recurring_advances_from_stored_when() {
        let h = harness();
        // Stored due Friday, repeat MWF: next is Monday regardless of how
        // late the process comes back up.
        let id = h
            .store
            .insert(NewReminder::repeating("#bots", "msg", friday(), vec![0, 2, 4]))
            .unwrap();

        h.engine
            .reconcile(friday() + chrono::Duration::hours(6), &h.transport)
            .await;

        let rec = h.store.find_one(&id).unwrap().unwrap();
        assert_eq!(rec.when, friday() + chrono::Duration::days(3));
        assert_eq!(h.timer.delays(), vec![Duration::from_secs(66 * 3_600)]);
    }

    #[tokio::test]
    async fn test_missed_recurring_occurrence_is_not_redelivered() {
        let h = harness();
        h.store
            .insert(NewReminder::repeating("#bots", "msg", friday(), vec![0, 2, 4]))
            .unwrap();

        h.engine
            .reconcile(friday() + chrono::Duration::seconds(300), &h.transport)
            .await;

        assert!(h.recording.sent().is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_recurrence_is_removed() {
        let h = harness();
        let id = h
            .store
            .insert(NewReminder::repeating("#bots", "msg", friday(), vec![]))
            .unwrap();

        h.engine.reconcile(friday(), &h.transport).await;

        assert!(h.timer.delays().is_empty());
        assert!(!h.engine.pending().contains(&id));
        assert!(h.store.find_one(&id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mixed_scan_handles_every_record() {
        let h = harness();
        let live = h
            .store
            .insert(NewReminder::once("#bots", "live", friday() + chrono::Duration::hours(1)))
            .unwrap();
        let stale = h
            .store
            .insert(NewReminder::once("#bots", "stale", friday() - chrono::Duration::days(2)))
            .unwrap();
        let recurring = h
            .store
            .insert(NewReminder::repeating("#bots", "weekly", friday(), vec![4]))
            .unwrap();

        h.engine.reconcile(friday(), &h.transport).await;

        assert!(h.engine.pending().contains(&live));
        assert!(!h.engine.pending().contains(&stale));
        assert!(h.store.find_one(&stale).unwrap().is_none());
        assert!(h.engine.pending().contains(&recurring));
        assert_eq!(
            h.store.find_one(&recurring).unwrap().unwrap().when,
            friday() + chrono::Duration::days(7)
        );
    }
}
