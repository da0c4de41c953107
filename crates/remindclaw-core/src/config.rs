//! RemindClaw configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemindClawConfig {
    /// IANA timezone used when an `at` request carries no timezone of its
    /// own. Parsed once at startup; an invalid name fails fast there.
    #[serde(default = "default_home_timezone")]
    pub home_timezone: String,
    /// Reminder database path.
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// Recovery grace threshold in seconds. A one-shot reminder overdue by
    /// this much or more at startup is dropped instead of delivered late.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: i64,
    /// Whether a recurring reminder whose recurrence yields no next
    /// occurrence is removed from the store.
    #[serde(default = "bool_true")]
    pub delete_exhausted: bool,
    #[serde(default)]
    pub channel: ChannelConfig,
}

fn default_home_timezone() -> String { "UTC".into() }
fn default_db_path() -> String { "~/.remindclaw/reminders.db".into() }
fn default_stale_after_secs() -> i64 { 86_400 }
fn bool_true() -> bool { true }

impl Default for RemindClawConfig {
    fn default() -> Self {
        Self {
            home_timezone: default_home_timezone(),
            db_path: default_db_path(),
            stale_after_secs: default_stale_after_secs(),
            delete_exhausted: true,
            channel: ChannelConfig::default(),
        }
    }
}

impl RemindClawConfig {
    /// Load config from the default path (~/.remindclaw/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::RemindClawError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::error::RemindClawError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::RemindClawError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the RemindClaw home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".remindclaw")
    }
}

/// Delivery channel configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default)]
    pub telegram: Option<TelegramChannelConfig>,
    #[serde(default)]
    pub webhook: Option<WebhookChannelConfig>,
}

/// Telegram Bot API delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChannelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bot_token: String,
}

/// Generic HTTP webhook delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookChannelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
}
