//! # RemindClaw Scheduler
//!
//! Reminder scheduling and recurrence engine. Handles "remind this channel
//! in 20m" and "remind this channel at 09:30 US/Eastern repeat MWF", and
//! guarantees each due occurrence is delivered exactly once, including
//! across process restarts.
//!
//! ## Design Principles
//! - SQLite persistence — reminders survive restarts
//! - One tokio timer per armed reminder — zero overhead when idle
//! - All stored instants are UTC; timezones exist only at the edges
//! - A pending set guards against double-arming the same reminder
//!
//! ## Architecture
//! ```text
//! user text ──▶ clock (parse tokens, resolve wall-clock to UTC)
//!                  │
//!                  ▼
//!            ReminderEngine::create ──▶ Store.insert ──▶ Timer.call_later
//!                                                            │
//!            Timer fires ──▶ ReminderEngine::fire ◀──────────┘
//!                  ├── Transport.send (best effort)
//!                  ├── one-shot: Store.remove
//!                  └── recurring: recur::next_occurrence ──▶ Store.save
//!                                                        ──▶ Timer.call_later
//!
//! process start ──▶ recovery::reconcile (rebuild timers from the store)
//! ```

pub mod clock;
pub mod dispatch;
pub mod engine;
pub mod format;
pub mod pending;
pub mod persistence;
pub mod recovery;
pub mod recur;
pub mod reminder;
pub mod store;

pub use clock::WEEKDAY_LETTERS;
pub use dispatch::{ConsoleTransport, TelegramTransport, WebhookTransport};
pub use engine::{DeleteOutcome, ReminderEngine, Timer, TokioTimer};
pub use pending::PendingSet;
pub use persistence::SqliteStore;
pub use reminder::{NewReminder, Reminder};
pub use store::{MemoryStore, ReminderStore};
