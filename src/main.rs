//! # RemindClaw — Channel Reminder Bot
//!
//! Schedules one-time and weekly-recurring reminders for a messaging
//! channel. Reminders live in SQLite and come back after restarts.
//!
//! Usage:
//!   remindclaw                          # console delivery, channel #general
//!   remindclaw --channel '#standup'     # default channel for bare commands
//!   remindclaw --db ./reminders.db --verbose
//!
//! Commands on stdin:
//!   in 20m [on #chan] message…
//!   at 09:30 [US/Eastern] [on #chan] message… [repeat MWF]
//!   list [#chan]
//!   delete <id>
//!   help | quit

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::EnvFilter;

use remindclaw_core::config::RemindClawConfig;
use remindclaw_core::traits::Transport;
use remindclaw_scheduler::{
    clock, format, ConsoleTransport, ReminderEngine, SqliteStore, TelegramTransport, TokioTimer,
    WebhookTransport,
};

#[derive(Parser)]
#[command(name = "remindclaw", version, about = "⏰ RemindClaw — Channel Reminder Bot")]
struct Cli {
    /// Config file (default: ~/.remindclaw/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Reminder database path (overrides config)
    #[arg(long)]
    db: Option<String>,

    /// Default channel for commands without an 'on' clause
    #[arg(long, default_value = "#general")]
    channel: String,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

const HELP: &str = "Commands:\n\
  in <duration> [on #chan] <message>            e.g. in 20m on #ops check the deploy\n\
  at <HH:MM> [tz] [on #chan] <message> [repeat <days>]\n\
                                                e.g. at 09:30 US/Eastern standup repeat MWF\n\
  list [#chan]\n\
  delete <id>\n\
  quit";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "remindclaw=debug" } else { "remindclaw=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => RemindClawConfig::load_from(std::path::Path::new(path))?,
        None => RemindClawConfig::load()?,
    };

    let db_path = shellexpand::tilde(cli.db.as_deref().unwrap_or(&config.db_path)).to_string();
    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = Arc::new(SqliteStore::open(std::path::Path::new(&db_path))?);

    let engine = ReminderEngine::new(store, Arc::new(TokioTimer), &config)?;
    let transport = select_transport(&config);

    // Rebuild timers lost with the previous process before taking commands.
    engine.reconcile(Utc::now(), &transport).await;

    println!("⏰ RemindClaw ready — delivery via {}, default channel {}", transport.name(), cli.channel);
    println!("   {} reminder(s) armed. Type 'help' for commands.", engine.pending().len());

    let stdin = tokio::io::stdin();
    let mut lines = tokio::io::BufReader::new(stdin).lines();
    while let Some(line) = lines.next_line().await? {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = tokens.split_first() else {
            continue;
        };
        let reply = match command {
            "in" => handle_in(&engine, &transport, &cli.channel, args),
            "at" => handle_at(&engine, &transport, &cli.channel, args),
            "list" => handle_list(&engine, &cli.channel, args),
            "delete" => handle_delete(&engine, &cli.channel, args),
            "help" => HELP.to_string(),
            "quit" | "exit" => break,
            _ => format!("Unknown command '{command}'. Type 'help'"),
        };
        println!("{reply}");
    }

    tracing::info!("👋 RemindClaw shutting down, {} reminder(s) still armed", engine.pending().len());
    Ok(())
}

/// Pick the delivery backend: telegram, then webhook, then console.
fn select_transport(config: &RemindClawConfig) -> Arc<dyn Transport> {
    if let Some(tg) = &config.channel.telegram
        && tg.enabled
        && !tg.bot_token.is_empty()
    {
        return Arc::new(TelegramTransport::new(&tg.bot_token));
    }
    if let Some(wh) = &config.channel.webhook
        && wh.enabled
        && !wh.url.is_empty()
    {
        return Arc::new(WebhookTransport::new(&wh.url));
    }
    Arc::new(ConsoleTransport)
}

/// `in <duration> [on #chan] message…`
fn handle_in(
    engine: &ReminderEngine,
    transport: &Arc<dyn Transport>,
    default_channel: &str,
    args: &[&str],
) -> String {
    let Some((&duration_token, rest)) = args.split_first() else {
        return HELP.to_string();
    };
    let (channel, message_parts) = match rest {
        ["on", chan, message @ ..] => (normalize_channel(chan), message),
        _ => (default_channel.to_string(), rest),
    };
    if message_parts.is_empty() {
        return "Tell me what to say, e.g. 'in 20m check the deploy'".to_string();
    }
    let message = message_parts.join(" ");
    match engine.create_relative(Utc::now(), &channel, duration_token, &message, transport) {
        Ok(id) => format!("Reminder '{id}' set for {channel}"),
        Err(e) => e.to_string(),
    }
}

/// `at <HH:MM> [tz] [on #chan] message… [repeat <days>]`
fn handle_at(
    engine: &ReminderEngine,
    transport: &Arc<dyn Transport>,
    default_channel: &str,
    args: &[&str],
) -> String {
    let Some((&time_token, mut rest)) = args.split_first() else {
        return HELP.to_string();
    };
    let tz_token = match rest.first() {
        Some(token) if clock::is_timezone(token) => {
            let token = *token;
            rest = &rest[1..];
            Some(token)
        }
        _ => None,
    };
    let (channel, rest) = match rest {
        ["on", chan, message @ ..] => (normalize_channel(chan), message),
        _ => (default_channel.to_string(), rest),
    };
    let (message_parts, repeat_token) = match rest {
        [message @ .., "repeat", letters] => (message, Some(*letters)),
        _ => (rest, None),
    };
    if message_parts.is_empty() {
        return "Tell me what to say, e.g. 'at 09:30 standup repeat MWF'".to_string();
    }
    let message = message_parts.join(" ");
    match engine.create_absolute(
        Utc::now(),
        &channel,
        time_token,
        tz_token,
        &message,
        repeat_token,
        transport,
    ) {
        Ok(id) => format!("Reminder '{id}' set for {channel}"),
        Err(e) => e.to_string(),
    }
}

/// `list [#chan]`
fn handle_list(engine: &ReminderEngine, default_channel: &str, args: &[&str]) -> String {
    let channel = args
        .first()
        .map(|chan| normalize_channel(chan))
        .unwrap_or_else(|| default_channel.to_string());
    match engine.list(&channel) {
        Ok(records) if records.is_empty() => {
            format!("There are no reminders for channel: {channel}")
        }
        Ok(records) => {
            let now = Utc::now();
            let mut lines = vec![format!("Here are the reminders for channel: {channel}")];
            for record in &records {
                let due_in = (record.when - now).num_seconds().max(0);
                lines.push(format!(
                    "{} (due in {})",
                    format::describe(record),
                    format::readable_time_delta(due_in)
                ));
            }
            lines.join("\n")
        }
        Err(e) => e.to_string(),
    }
}

/// `delete <id>`
fn handle_delete(engine: &ReminderEngine, default_channel: &str, args: &[&str]) -> String {
    let Some(id) = args.first() else {
        return "Which one? 'delete <id>', ids come from 'list'".to_string();
    };
    match engine.delete(default_channel, id) {
        Ok(outcome) => outcome.user_message(id),
        Err(e) => e.to_string(),
    }
}

fn normalize_channel(name: &str) -> String {
    if name.starts_with('#') {
        name.to_string()
    } else {
        format!("#{name}")
    }
}
