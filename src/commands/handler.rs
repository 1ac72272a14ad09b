//! Command handler implementation.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeDelta};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::types::{AdminCommand, CommandResult};
use crate::config::RuntimeConfig;
use crate::forwarder::{ErrorKind, PipelineState};
use crate::telegram::{InboundMessage, Transport};

/// Number of error records shown by `/logs`.
const LOGS_SHOWN: usize = 10;

/// Longest error text shown per `/logs` entry.
const LOG_ENTRY_MAX_CHARS: usize = 100;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Handles admin commands against the shared pipeline state.
pub struct AdminHandler<T: Transport> {
    transport: Arc<T>,

    /// Runtime configuration (shared with the pipeline).
    config: RuntimeConfig,

    /// Pipeline state (shared with the pipeline).
    state: Arc<RwLock<PipelineState>>,
}

impl<T: Transport> AdminHandler<T> {
    /// Creates a new command handler.
    #[must_use]
    pub fn new(transport: Arc<T>, config: RuntimeConfig, state: Arc<RwLock<PipelineState>>) -> Self {
        Self {
            transport,
            config,
            state,
        }
    }

    /// Executes a command message and replies in the admin's private chat.
    ///
    /// Returns `None` when the message is not a command or the sender is not
    /// the admin; nothing is sent in either case.
    pub async fn handle<M>(&self, message: &InboundMessage<M>) -> Option<CommandResult> {
        let result = self.try_handle(message.sender_id, &message.text).await?;

        let admin = self.config.settings().admin_user_id;
        if let Err(e) = self.transport.send_text(admin, &result.message).await {
            error!("Failed to reply to admin: {}", e);
            self.state
                .write()
                .await
                .record_error(ErrorKind::AdminReply, None, e.to_string());
        }

        Some(result)
    }

    /// Authorizes the sender, then parses and executes the command.
    pub async fn try_handle(&self, sender_id: Option<i64>, text: &str) -> Option<CommandResult> {
        let command = AdminCommand::parse(text)?;

        let admin = self.config.settings().admin_user_id;
        if sender_id != Some(admin) {
            warn!(
                "Ignoring {} from unauthorized sender {:?}",
                command.name(),
                sender_id
            );
            return None;
        }

        debug!("Handling command: {}", command);
        self.state.write().await.record_command(command.to_string());
        let result = self.execute(command).await;
        info!("Command result: success={}", result.success);

        Some(result)
    }

    /// Executes a parsed command.
    async fn execute(&self, command: AdminCommand) -> CommandResult {
        match command {
            AdminCommand::Start => self.handle_start().await,
            AdminCommand::Stop => self.handle_stop().await,
            AdminCommand::Status => self.handle_status().await,
            AdminCommand::Stats => self.handle_stats().await,
            AdminCommand::Config => self.handle_config().await,
            AdminCommand::Logs => self.handle_logs().await,
            AdminCommand::Test => self.handle_test().await,
            AdminCommand::ResetStats => self.handle_reset_stats().await,
            AdminCommand::UpdateReference(text) => self.handle_update_reference(&text).await,
            AdminCommand::UpdateChannel(link) => self.handle_update_channel(&link).await,
            AdminCommand::Help => handle_help(),
            AdminCommand::Unknown(word) => CommandResult::error(format!(
                "❓ Unknown command: {word}\n\nUse /help to see available commands."
            )),
        }
    }

    async fn handle_start(&self) -> CommandResult {
        if self.state.write().await.start() {
            info!("Message forwarding started by admin");
            CommandResult::success(
                "✅ Message forwarding started!\n\n\
                 Messages from the source group are now forwarded to the destination group.",
            )
        } else {
            CommandResult::success("▶ Forwarding is already running.")
        }
    }

    async fn handle_stop(&self) -> CommandResult {
        if self.state.write().await.stop() {
            info!("Message forwarding stopped by admin");
            CommandResult::success("⏹ Message forwarding stopped!")
        } else {
            CommandResult::success("⏹ Forwarding is already stopped.")
        }
    }

    async fn handle_status(&self) -> CommandResult {
        let state = self.state.read().await;
        let counters = state.counters();

        let status = if state.is_running() {
            "🟢 RUNNING"
        } else {
            "🔴 STOPPED"
        };

        let uptime_secs = u64::try_from(state.uptime().num_seconds()).unwrap_or_default();

        let message = format!(
            "🤖 Bot Status\n\n\
             State: {status}\n\
             Uptime: {}\n\
             Started: {}\n\
             Last forward: {}\n\
             Forwarded: {} | Filtered: {} | Errors: {}\n\n\
             Use /stats for detailed statistics.",
            format_duration(uptime_secs),
            state.started_at().format(TIME_FORMAT),
            format_time(state.last_forwarded_at()),
            counters.forwarded,
            counters.filtered,
            counters.errors,
        );

        CommandResult::success(message)
    }

    async fn handle_stats(&self) -> CommandResult {
        let state = self.state.read().await;
        let counters = state.counters();
        let recent_errors = state.errors().count_since(Local::now() - TimeDelta::hours(24));

        let message = format!(
            "📊 Statistics (since {})\n\n\
             Processed: {}\n\
             Forwarded: {}\n\
             Filtered: {}\n\
             Errors: {}\n\
             Errors (24h): {}\n\
             Success rate: {:.1}%\n\
             Commands executed: {}\n\
             Last forward: {}\n\n\
             Use /logs to view recent errors.",
            state.stats_since().format(TIME_FORMAT),
            counters.processed,
            counters.forwarded,
            counters.filtered,
            counters.errors,
            recent_errors,
            counters.success_rate(),
            state.commands().len(),
            format_time(state.last_forwarded_at()),
        );

        CommandResult::success(message)
    }

    async fn handle_config(&self) -> CommandResult {
        let summary = self.config.summary().await;
        let check = |ok: bool| if ok { "✅" } else { "❌" };
        let or_none = |s: &str| {
            if s.is_empty() {
                "(none)".to_owned()
            } else {
                s.to_owned()
            }
        };

        let message = format!(
            "⚙️ Configuration\n\n\
             Session: {}\n\
             API configured: {}\n\
             Phone configured: {}\n\n\
             Source group: {}\n\
             Destination group: {}\n\
             Admin user: {}\n\n\
             Reference text: {}\n\
             Channel link: {}\n\n\
             Message length: {}..={}\n\
             Forward media: {}\n\
             Log level: {}\n\n\
             Use /update_reference or /update_channel to change settings.",
            summary.session_name,
            check(summary.api_configured),
            check(summary.phone_configured),
            summary.source_group_id,
            summary.destination_group_id,
            summary.admin_user_id,
            or_none(&summary.reference_text),
            or_none(&summary.channel_link),
            summary.min_message_length,
            summary.max_message_length,
            check(summary.forward_media),
            summary.log_level,
        );

        CommandResult::success(message)
    }

    async fn handle_logs(&self) -> CommandResult {
        let state = self.state.read().await;
        let errors = state.errors();

        if errors.is_empty() {
            return CommandResult::success("✅ No recent errors found!");
        }

        let mut lines = vec!["🚨 Recent errors:".to_owned(), String::new()];
        let mut shown = 0;
        for (i, record) in errors.recent(LOGS_SHOWN).enumerate() {
            lines.push(format!(
                "{}. {} - {}\n   {}",
                i + 1,
                record.timestamp.format("%m-%d %H:%M"),
                record.kind,
                truncate(&record.message, LOG_ENTRY_MAX_CHARS)
            ));
            shown += 1;
        }
        lines.push(String::new());
        lines.push(format!("Showing {shown} of {} stored errors.", errors.len()));

        CommandResult::success(lines.join("\n"))
    }

    async fn handle_test(&self) -> CommandResult {
        let settings = self.config.settings();
        let mut lines = vec!["🔍 Connection test:".to_owned(), String::new()];
        let mut all_ok = true;

        match self.transport.whoami().await {
            Ok(me) => lines.push(format!("✅ Telegram connection: OK ({me})")),
            Err(e) => {
                all_ok = false;
                lines.push(format!("❌ Telegram connection: {e}"));
            }
        }

        for (label, chat_id) in [
            ("Source group", settings.source_group_id),
            ("Destination group", settings.destination_group_id),
        ] {
            match self.transport.chat_title(chat_id).await {
                Ok(title) => lines.push(format!("✅ {label}: OK ({title})")),
                Err(e) => {
                    all_ok = false;
                    lines.push(format!("❌ {label}: {e}"));
                }
            }
        }

        let message = lines.join("\n");
        if all_ok {
            CommandResult::success(message)
        } else {
            CommandResult::error(message)
        }
    }

    async fn handle_reset_stats(&self) -> CommandResult {
        self.state.write().await.reset_stats();
        info!("Statistics reset by admin");
        CommandResult::success("🔄 Statistics reset. All counters are back to zero.")
    }

    async fn handle_update_reference(&self, text: &str) -> CommandResult {
        if text.trim().is_empty() {
            return CommandResult::error(
                "❌ Please provide new reference text.\nUsage: /update_reference <text>",
            );
        }

        match self.config.update_reference_text(text).await {
            Ok(()) => CommandResult::success(format!(
                "✅ Reference text updated!\n\nNew reference: {}",
                text.trim()
            )),
            Err(e) => CommandResult::error(format!("❌ {e}")),
        }
    }

    async fn handle_update_channel(&self, link: &str) -> CommandResult {
        if link.trim().is_empty() {
            return CommandResult::error(
                "❌ Please provide a new channel link.\nUsage: /update_channel <url>",
            );
        }

        match self.config.update_channel_link(link).await {
            Ok(()) => CommandResult::success(format!(
                "✅ Channel link updated!\n\nNew link: {}",
                link.trim()
            )),
            Err(e) => CommandResult::error(format!("❌ {e}")),
        }
    }
}

impl<T: Transport> std::fmt::Debug for AdminHandler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminHandler")
            .field("admin", &self.config.settings().admin_user_id)
            .finish_non_exhaustive()
    }
}

fn handle_help() -> CommandResult {
    let mut lines = vec!["🤖 Forward Bot - Admin Commands".to_owned()];

    let mut current_section = "";
    for (section, usage, desc) in AdminCommand::all_commands() {
        if section != current_section {
            lines.push(String::new());
            lines.push(format!("{section}:"));
            current_section = section;
        }
        lines.push(format!("  {usage} - {desc}"));
    }

    CommandResult::success(lines.join("\n"))
}

/// Truncates a string to a maximum length, adding "..." if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}

/// Formats a duration in seconds to a human-readable string.
pub fn format_duration(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;

    if days > 0 {
        format!("{days}d {hours}h {mins}m")
    } else if hours > 0 {
        format!("{hours}h {mins}m")
    } else if mins > 0 {
        format!("{mins}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

fn format_time(time: Option<DateTime<Local>>) -> String {
    time.map_or_else(|| "never".to_owned(), |t| t.format(TIME_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;
    use crate::config::ForwardSettings;
    use crate::telegram::{AccountInfo, TelegramError};
    use crate::text::OutboundMessage;

    const ADMIN: i64 = 111;

    #[derive(Default)]
    struct Replies {
        texts: Mutex<Vec<(i64, String)>>,
        offline: bool,
    }

    #[async_trait]
    impl Transport for Replies {
        type Media = ();

        async fn send_message(&self, _: i64, _: OutboundMessage) -> Result<(), TelegramError> {
            Ok(())
        }

        async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
            if self.offline {
                return Err(TelegramError::Connection("offline".to_owned()));
            }
            self.texts.lock().await.push((chat_id, text.to_owned()));
            Ok(())
        }

        async fn whoami(&self) -> Result<AccountInfo, TelegramError> {
            if self.offline {
                return Err(TelegramError::Connection("offline".to_owned()));
            }
            Ok(AccountInfo {
                id: 5,
                username: Some("forwarder".to_owned()),
                first_name: "Bot".to_owned(),
            })
        }

        async fn chat_title(&self, chat_id: i64) -> Result<String, TelegramError> {
            if chat_id == -100_1 {
                Ok("Source".to_owned())
            } else {
                Err(TelegramError::PeerNotFound(chat_id))
            }
        }
    }

    fn handler_with(transport: Replies) -> AdminHandler<Replies> {
        AdminHandler::new(
            Arc::new(transport),
            RuntimeConfig::from_settings(ForwardSettings::new(-100_1, -100_2, ADMIN)),
            Arc::new(RwLock::new(PipelineState::new())),
        )
    }

    fn handler() -> AdminHandler<Replies> {
        handler_with(Replies::default())
    }

    async fn run(h: &AdminHandler<Replies>, text: &str) -> CommandResult {
        h.try_handle(Some(ADMIN), text).await.unwrap()
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello, World!", 5), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30), "30s");
        assert_eq!(format_duration(90), "1m 30s");
        assert_eq!(format_duration(3600), "1h 0m");
        assert_eq!(format_duration(3660), "1h 1m");
        assert_eq!(format_duration(90_061), "1d 1h 1m");
    }

    #[test]
    fn test_help_lists_every_command() {
        let help = handle_help().message;
        for (_, usage, _) in AdminCommand::all_commands() {
            assert!(help.contains(usage), "help is missing {usage}");
        }
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let h = handler();
        assert!(run(&h, "/start").await.message.contains("started"));
        assert!(h.state.read().await.is_running());
        assert!(run(&h, "/start").await.message.contains("already running"));

        assert!(run(&h, "/stop").await.message.contains("stopped"));
        assert!(!h.state.read().await.is_running());
    }

    #[tokio::test]
    async fn test_non_admin_ignored() {
        let h = handler();
        assert!(h.try_handle(Some(222), "/start").await.is_none());
        assert!(h.try_handle(None, "/start").await.is_none());
        assert!(!h.state.read().await.is_running());
    }

    #[tokio::test]
    async fn test_non_admin_cannot_update_reference() {
        let h = handler();
        assert!(h.try_handle(Some(222), "/update_reference Hacked").await.is_none());
        assert_eq!(h.config.customization().await.reference_text, "📢 Forwarded by Bot");
    }

    #[tokio::test]
    async fn test_update_reference() {
        let h = handler();
        let result = run(&h, "/update_reference Hello World").await;
        assert!(result.success);
        assert_eq!(h.config.customization().await.reference_text, "Hello World");
    }

    #[tokio::test]
    async fn test_update_reference_without_text() {
        let h = handler();
        let result = run(&h, "/update_reference").await;
        assert!(!result.success);
        assert!(result.message.contains("Usage"));
    }

    #[tokio::test]
    async fn test_update_channel_validates() {
        let h = handler();
        let result = run(&h, "/update_channel not-a-url").await;
        assert!(!result.success);
        assert_eq!(h.config.customization().await.channel_link, "https://t.me/your_channel");

        let result = run(&h, "/update_channel https://t.me/mychannel").await;
        assert!(result.success);
        assert_eq!(h.config.customization().await.channel_link, "https://t.me/mychannel");
    }

    #[tokio::test]
    async fn test_status_reports_state() {
        let h = handler();
        assert!(run(&h, "/status").await.message.contains("STOPPED"));
        run(&h, "/start").await;
        let status = run(&h, "/status").await.message;
        assert!(status.contains("RUNNING"));
        assert!(status.contains("Uptime"));
    }

    #[tokio::test]
    async fn test_stats_and_reset() {
        let h = handler();
        {
            let mut state = h.state.write().await;
            state.record_forwarded();
            state.record_filtered();
            state.record_failure(9, "boom");
        }
        let stats = run(&h, "/stats").await.message;
        assert!(stats.contains("Forwarded: 1"));
        assert!(stats.contains("Errors: 1"));
        assert!(stats.contains("Errors (24h): 1"));

        run(&h, "/reset_stats").await;
        let state = h.state.read().await;
        assert_eq!(state.counters().processed, 0);
        assert!(state.errors().is_empty());
        assert!(state.commands().is_empty());
    }

    #[tokio::test]
    async fn test_command_history() {
        let h = handler();
        run(&h, "/start").await;
        run(&h, "/update_reference Hello World").await;
        assert!(h.try_handle(Some(222), "/stop").await.is_none());

        let stats = run(&h, "/stats").await.message;
        assert!(stats.contains("Commands executed: 3"));

        let state = h.state.read().await;
        let history: Vec<_> = state.commands().recent(3).map(|c| c.command.clone()).collect();
        assert_eq!(history, vec!["/start", "/update_reference Hello World", "/stats"]);
    }

    #[tokio::test]
    async fn test_logs_shows_at_most_ten() {
        let h = handler();
        assert!(run(&h, "/logs").await.message.contains("No recent errors"));

        {
            let mut state = h.state.write().await;
            for n in 0..15 {
                state.record_failure(n, format!("failure {n} {}", "x".repeat(200)));
            }
        }
        let logs = run(&h, "/logs").await.message;
        assert!(logs.contains("Showing 10 of 15"));
        assert!(logs.contains("Forward failed"));
        assert!(logs.contains("failure 14"));
        assert!(!logs.contains("failure 4 "));
        assert!(!logs.contains(&"x".repeat(150)));
    }

    #[tokio::test]
    async fn test_config_hides_credentials() {
        let h = handler();
        let config = run(&h, "/config").await.message;
        assert!(config.contains("Source group: -1001"));
        assert!(config.contains("API configured: ❌"));
    }

    #[tokio::test]
    async fn test_connection_test_reports_each_check() {
        let h = handler();
        let result = run(&h, "/test").await;
        assert!(!result.success);
        assert!(result.message.contains("✅ Telegram connection: OK (Bot (@forwarder))"));
        assert!(result.message.contains("✅ Source group: OK (Source)"));
        assert!(result.message.contains("❌ Destination group"));
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let h = handler();
        let result = run(&h, "/dance").await;
        assert!(!result.success);
        assert!(result.message.contains("/dance"));
        assert!(result.message.contains("/help"));
    }

    #[tokio::test]
    async fn test_handle_replies_to_admin_chat() {
        let h = handler();
        let msg: InboundMessage = InboundMessage::text(1, ADMIN, ADMIN, "/help");
        h.handle(&msg).await.unwrap();

        let texts = h.transport.texts.lock().await;
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].0, ADMIN);
    }

    #[tokio::test]
    async fn test_failed_reply_is_logged() {
        let h = handler_with(Replies {
            offline: true,
            ..Replies::default()
        });
        let msg: InboundMessage = InboundMessage::text(1, ADMIN, ADMIN, "/start");
        h.handle(&msg).await.unwrap();

        let state = h.state.read().await;
        assert!(state.is_running());
        assert_eq!(state.counters().errors, 1);
        let record = state.errors().recent(1).next().unwrap();
        assert_eq!(record.kind, ErrorKind::AdminReply);
        assert!(record.message.contains("offline"));
    }
}
