//! Core traits implemented by delivery backends.

use async_trait::async_trait;

use crate::error::Result;

/// A message delivery backend.
///
/// The scheduler borrows a transport handle for each timer registration and
/// calls `send` when the reminder comes due. Delivery is best-effort: the
/// scheduler logs a failed send and carries on with its bookkeeping.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Backend name for logs ("telegram", "webhook", "console").
    fn name(&self) -> &str;

    /// Deliver `text` to `target` (a channel or user identifier).
    async fn send(&self, target: &str, text: &str) -> Result<()>;
}
