//! RemindClaw error type, shared across the workspace.

/// Workspace-wide error.
#[derive(Debug, thiserror::Error)]
pub enum RemindClawError {
    /// Unparseable user input (duration, time, timezone, weekday token).
    /// The message is user-facing and is sent back verbatim; never logged
    /// as a system fault.
    #[error("{0}")]
    Format(String),

    /// Configuration load/parse failure.
    #[error("Config error: {0}")]
    Config(String),

    /// Persistence failure.
    #[error("Store error: {0}")]
    Store(String),

    /// Delivery backend failure.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RemindClawError>;

impl RemindClawError {
    /// True for errors that carry a message meant for the requesting user.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Format(_))
    }
}
