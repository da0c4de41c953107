//! Reminder records — the core data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled reminder. The sole persisted entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    /// Store-assigned id (32 lowercase hex chars). Immutable once assigned.
    pub id: String,
    /// Delivery target, e.g. "#standup". Non-ASCII is fine.
    pub channel: String,
    /// Text sent verbatim when the reminder comes due.
    pub message: String,
    /// The next (or only) due instant. Always UTC; timezone conversion
    /// happens at creation and display time only.
    pub when: DateTime<Utc>,
    /// Recurrence weekdays, Monday=0 through Sunday=6, ascending and unique.
    /// `None` means one-shot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<Vec<u8>>,
}

/// A reminder that has not been inserted yet; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub channel: String,
    pub message: String,
    pub when: DateTime<Utc>,
    pub repeat: Option<Vec<u8>>,
}

impl NewReminder {
    pub fn once(channel: &str, message: &str, when: DateTime<Utc>) -> Self {
        Self {
            channel: channel.to_string(),
            message: message.to_string(),
            when,
            repeat: None,
        }
    }

    pub fn repeating(channel: &str, message: &str, when: DateTime<Utc>, days: Vec<u8>) -> Self {
        Self {
            channel: channel.to_string(),
            message: message.to_string(),
            when,
            repeat: Some(days),
        }
    }

    pub(crate) fn into_reminder(self, id: String) -> Reminder {
        Reminder {
            id,
            channel: self.channel,
            message: self.message,
            when: self.when,
            repeat: self.repeat,
        }
    }
}

/// Check that `id` has the shape the store assigns (32 lowercase hex chars).
/// Used by the delete path before any lookup.
pub fn is_valid_id(id: &str) -> bool {
    id.len() == 32 && id.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Generate a fresh store id.
pub(crate) fn fresh_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
