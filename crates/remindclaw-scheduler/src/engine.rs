//! Reminder engine — creates reminders, fires them when due, and keeps
//! recurring ones rolling. One timer is outstanding per live reminder; the
//! pending set is the bookkeeping that makes that invariant hold.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures::future::BoxFuture;
use remindclaw_core::config::RemindClawConfig;
use remindclaw_core::error::{RemindClawError, Result};
use remindclaw_core::traits::Transport;

use crate::clock;
use crate::pending::PendingSet;
use crate::recur;
use crate::reminder::{is_valid_id, NewReminder, Reminder};
use crate::store::ReminderStore;

/// One-shot timer facility. Invokes the continuation once, after at least
/// `delay` has elapsed. The continuation carries everything it needs
/// (reminder id and transport handle), so the timer stays dumb.
pub trait Timer: Send + Sync {
    fn call_later(&self, delay: Duration, task: BoxFuture<'static, ()>);
}

/// Production timer: a detached tokio task that sleeps out the delay.
pub struct TokioTimer;

impl Timer for TokioTimer {
    fn call_later(&self, delay: Duration, task: BoxFuture<'static, ()>) {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
    }
}

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    InvalidId,
}

impl DeleteOutcome {
    /// The line sent back to the requesting user.
    pub fn user_message(&self, id: &str) -> String {
        match self {
            Self::Deleted => format!("Reminder '{id}' deleted"),
            Self::NotFound => format!("No reminder found with id '{id}'"),
            Self::InvalidId => format!("Invalid ID format '{id}'"),
        }
    }
}

/// The reminder engine. A cheap-clone handle: the store, timer, and pending
/// set are shared behind `Arc`, so timer continuations carry their own copy.
#[derive(Clone)]
pub struct ReminderEngine {
    pub(crate) store: Arc<dyn ReminderStore>,
    pub(crate) timer: Arc<dyn Timer>,
    pub(crate) pending: Arc<PendingSet>,
    pub(crate) home_tz: Tz,
    pub(crate) stale_after_secs: i64,
    pub(crate) delete_exhausted: bool,
}

impl ReminderEngine {
    /// Build an engine. The home timezone is parsed here, once; a bad name
    /// in the config fails startup rather than every `at` request.
    pub fn new(
        store: Arc<dyn ReminderStore>,
        timer: Arc<dyn Timer>,
        config: &RemindClawConfig,
    ) -> Result<Self> {
        let home_tz = config.home_timezone.parse::<Tz>().map_err(|_| {
            RemindClawError::Config(format!("Unknown home_timezone '{}'", config.home_timezone))
        })?;
        Ok(Self {
            store,
            timer,
            pending: Arc::new(PendingSet::new()),
            home_tz,
            stale_after_secs: config.stale_after_secs,
            delete_exhausted: config.delete_exhausted,
        })
    }

    /// Ids with an outstanding timer. Exposed for status output.
    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    /// Create a reminder from a relative duration token ("20m", "2h", "1d").
    pub fn create_relative(
        &self,
        now: DateTime<Utc>,
        channel: &str,
        duration_token: &str,
        message: &str,
        transport: &Arc<dyn Transport>,
    ) -> Result<String> {
        let offset_secs = clock::parse_relative(duration_token)?;
        let when = now + chrono::Duration::seconds(offset_secs);
        self.create(now, channel, message, when, None, transport)
    }

    /// Create a reminder from a wall-clock time token, optional timezone
    /// name, and optional weekday-letter recurrence token. With a recurrence,
    /// the first occurrence is rolled forward onto the nearest repeat
    /// weekday (today counts if the time has not passed yet).
    pub fn create_absolute(
        &self,
        now: DateTime<Utc>,
        channel: &str,
        time_token: &str,
        tz_token: Option<&str>,
        message: &str,
        repeat_token: Option<&str>,
        transport: &Arc<dyn Transport>,
    ) -> Result<String> {
        let (hour, minute, tz) = clock::parse_absolute(time_token, tz_token, self.home_tz)?;
        let repeat = repeat_token.map(clock::parse_weekday_set).transpose()?;
        let mut when = clock::resolve_next_clock_time(hour, minute, tz, now)?;
        if let Some(days) = &repeat {
            when = recur::align_to_weekdays(when, days);
        }
        self.create(now, channel, message, when, repeat, transport)
    }

    /// Persist a reminder whose inputs are already resolved and arm its
    /// timer. The delay is clamped to zero so a `when` in the very recent
    /// past still fires on the next tick.
    pub fn create(
        &self,
        now: DateTime<Utc>,
        channel: &str,
        message: &str,
        when: DateTime<Utc>,
        repeat: Option<Vec<u8>>,
        transport: &Arc<dyn Transport>,
    ) -> Result<String> {
        let id = self.store.insert(NewReminder {
            channel: channel.to_string(),
            message: message.to_string(),
            when,
            repeat,
        })?;
        let delay = (when - now).num_seconds().max(0);
        tracing::info!("📅 Reminder '{id}' armed for {channel}, due in {delay}s");
        self.arm(&id, delay, transport);
        Ok(id)
    }

    /// Timer entry point: deliver the reminder with this id, then delete or
    /// reschedule it.
    pub async fn fire(&self, id: &str, transport: Arc<dyn Transport>) {
        self.fire_at(Utc::now(), id, transport).await;
    }

    /// `fire` with the clock injected, so tests can pin the instant.
    pub(crate) async fn fire_at(&self, now: DateTime<Utc>, id: &str, transport: Arc<dyn Transport>) {
        let record = match self.store.find_one(id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                // Deleted between arming and firing. Nothing to send.
                self.pending.discard(id);
                return;
            }
            Err(e) => {
                // The timer has already burned; leaving the id pending would
                // strand it. Drop it and let the next reconcile re-arm.
                tracing::warn!("⚠️ Lookup failed for reminder '{id}': {e}");
                self.pending.discard(id);
                return;
            }
        };

        tracing::info!("🔔 Reminder '{id}' due, delivering to {}", record.channel);
        if let Err(e) = transport.send(&record.channel, &record.message).await {
            tracing::warn!("⚠️ {} delivery failed for reminder '{id}': {e}", transport.name());
        }

        let Some(days) = record.repeat.clone() else {
            if let Err(e) = self.store.remove(id) {
                tracing::warn!("⚠️ Failed to remove delivered reminder '{id}': {e}");
            }
            self.pending.discard(id);
            return;
        };

        match recur::next_occurrence(record.when, &days) {
            Some((next_when, _)) => {
                let mut record = record;
                record.when = next_when;
                if let Err(e) = self.store.save(&record) {
                    tracing::warn!("⚠️ Failed to persist reschedule of '{id}': {e}");
                }
                let delay = (next_when - now).num_seconds();
                tracing::info!("🔁 Reminder '{id}' rescheduled, due in {delay}s");
                self.arm(id, delay, &transport);
            }
            None => {
                tracing::info!("🛑 Reminder '{id}' has no next occurrence, recurrence stops");
                self.pending.discard(id);
                if self.delete_exhausted {
                    if let Err(e) = self.store.remove(id) {
                        tracing::warn!("⚠️ Failed to remove exhausted reminder '{id}': {e}");
                    }
                }
            }
        }
    }

    /// Delete a reminder on behalf of a channel. The id shape is validated
    /// before any lookup; the channel is for reporting only.
    pub fn delete(&self, channel: &str, id: &str) -> Result<DeleteOutcome> {
        if !is_valid_id(id) {
            return Ok(DeleteOutcome::InvalidId);
        }
        match self.store.find_one(id)? {
            Some(_) => {
                self.store.remove(id)?;
                tracing::info!("🗑️ Reminder '{id}' deleted on request from {channel}");
                Ok(DeleteOutcome::Deleted)
            }
            None => Ok(DeleteOutcome::NotFound),
        }
    }

    /// Reminders for one channel, soonest first.
    pub fn list(&self, channel: &str) -> Result<Vec<Reminder>> {
        self.store.for_channel(channel)
    }

    /// Mark the id pending and register its timer. Pending membership and
    /// timer registration always travel together through here.
    pub(crate) fn arm(&self, id: &str, delay_secs: i64, transport: &Arc<dyn Transport>) {
        self.pending.insert(id);
        let engine = self.clone();
        let transport = Arc::clone(transport);
        let id = id.to_string();
        self.timer.call_later(
            Duration::from_secs(delay_secs.max(0) as u64),
            Box::pin(async move {
                engine.fire(&id, transport).await;
            }),
        );
    }
}
