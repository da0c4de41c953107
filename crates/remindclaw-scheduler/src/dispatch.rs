//! Delivery backends — send reminder text to where the channel lives.
//! Supports: Telegram Bot API, generic HTTP webhook, and local console.

use async_trait::async_trait;
use remindclaw_core::error::{RemindClawError, Result};
use remindclaw_core::traits::Transport;

const SEND_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Telegram Bot API delivery via `sendMessage`. The reminder channel is the
/// chat id.
pub struct TelegramTransport {
    bot_token: String,
    client: reqwest::Client,
}

impl TelegramTransport {
    pub fn new(bot_token: &str) -> Self {
        Self {
            bot_token: bot_token.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, target: &str, text: &str) -> Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": target,
                "text": escape_markdown(text),
                "parse_mode": "Markdown"
            }))
            .timeout(SEND_TIMEOUT)
            .send()
            .await
            .map_err(|e| RemindClawError::Transport(format!("Telegram send failed: {e}")))?;

        if resp.status().is_success() {
            tracing::info!("✅ Telegram reminder sent to {target}");
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(RemindClawError::Transport(format!("Telegram API error {status}: {body}")))
        }
    }
}

/// Generic HTTP webhook delivery: POST with a JSON body.
pub struct WebhookTransport {
    url: String,
    client: reqwest::Client,
}

impl WebhookTransport {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Transport for WebhookTransport {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, target: &str, text: &str) -> Result<()> {
        let resp = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({
                "channel": target,
                "text": text,
            }))
            .timeout(SEND_TIMEOUT)
            .send()
            .await
            .map_err(|e| RemindClawError::Transport(format!("Webhook send failed: {e}")))?;

        if resp.status().is_success() {
            tracing::info!("✅ Webhook reminder sent to {}", self.url);
            Ok(())
        } else {
            Err(RemindClawError::Transport(format!("Webhook error {}", resp.status())))
        }
    }
}

/// Prints reminders to stdout. The fallback when no channel is configured.
#[derive(Default)]
pub struct ConsoleTransport;

#[async_trait]
impl Transport for ConsoleTransport {
    fn name(&self) -> &str {
        "console"
    }

    async fn send(&self, target: &str, text: &str) -> Result<()> {
        println!("📣 [{target}] {text}");
        Ok(())
    }
}

/// Escape Telegram MarkdownV1 special characters.
fn escape_markdown(s: &str) -> String {
    s.replace('_', "\\_")
        .replace('*', "\\*")
        .replace('[', "\\[")
        .replace('`', "\\`")
}
