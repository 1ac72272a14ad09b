//! Telegram Forward Bot - Main Entry Point
//!
//! A Telegram userbot that republishes messages from a source group into a
//! destination group, cleaned of links and tagged with a reference.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use dialoguer::{Input, Password};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use telegram_forward_bot::commands::{AdminHandler, format_duration};
use telegram_forward_bot::config::{ForwardSettings, RuntimeConfig, TelegramConfig};
use telegram_forward_bot::forwarder::{ErrorKind, ForwardingPipeline, PipelineState};
use telegram_forward_bot::router::{Route, route};
use telegram_forward_bot::telegram::{
    SignIn, TelegramBot, Transport, UPDATE_MAX_FAILURES, UpdateBackoff,
};

/// Telegram userbot that forwards cleaned group messages.
#[derive(Parser, Debug)]
#[command(name = "forward_bot")]
#[command(about = "Forward messages between Telegram groups without links or mentions")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error). Overrides LOG_LEVEL.
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load environment variables before logging so LOG_LEVEL applies
    let env_loaded = dotenvy::from_filename(&args.env_file);

    let env_level = std::env::var("LOG_LEVEL").ok();
    init_logging(args.log_level.as_deref().or(env_level.as_deref()).unwrap_or("info"));

    if let Err(e) = env_loaded {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    // Load configurations
    let tg_config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;

    let settings = ForwardSettings::from_env()
        .context("Failed to load forwarding settings from environment")?;

    info!(
        "Forwarding {} -> {} (admin {})",
        settings.source_group_id, settings.destination_group_id, settings.admin_user_id
    );

    // Connect to Telegram
    let bot = TelegramBot::connect(&tg_config, settings.send_interval_ms)
        .await
        .context("Failed to connect to Telegram")?;

    // Handle authentication if needed
    if !bot.is_authorized().await.context("Failed to check authorization")? {
        authenticate(&bot, &tg_config).await?;
    }

    bot.refresh_chats().await.context("Failed to load dialogs")?;

    let me = bot.whoami().await.context("Failed to get account info")?;
    info!("Signed in as {}", me);

    let source = verify_group(&bot, "source", settings.source_group_id).await?;
    let destination = verify_group(&bot, "destination", settings.destination_group_id).await?;

    let admin = settings.admin_user_id;
    let bot = Arc::new(bot);
    let config = RuntimeConfig::new(&tg_config, settings);
    let state = Arc::new(RwLock::new(PipelineState::new()));

    let pipeline = ForwardingPipeline::new(Arc::clone(&bot), config.clone(), Arc::clone(&state));
    let handler = AdminHandler::new(Arc::clone(&bot), config.clone(), Arc::clone(&state));

    let mut feed = bot
        .stream_updates()
        .await
        .context("Failed to start update stream")?;

    notify_admin(
        &bot,
        admin,
        &format!(
            "🤖 Forward bot is online.\n\n\
             Source: {source}\n\
             Destination: {destination}\n\n\
             Forwarding is stopped. Send /start to begin or /help for commands."
        ),
    )
    .await;

    info!("Bot is running. Use Ctrl+C to stop.");

    let mut backoff = UpdateBackoff::default();
    let mut stream_failed = false;

    loop {
        let delay = backoff.pending_delay();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
            update = async {
                tokio::time::sleep(delay).await;
                feed.next().await
            } => {
                let message = match update {
                    Ok(Some(message)) => {
                        backoff.on_success();
                        message
                    }
                    Ok(None) => {
                        backoff.on_success();
                        continue;
                    }
                    Err(e) => {
                        state
                            .write()
                            .await
                            .record_error(ErrorKind::Updates, None, e.to_string());
                        match backoff.on_error() {
                            Some(wait) => {
                                error!("Failed to receive update: {}. Retrying in {:?}", e, wait);
                                continue;
                            }
                            None => {
                                error!(
                                    "Failed to receive update {} times in a row, giving up: {}",
                                    UPDATE_MAX_FAILURES, e
                                );
                                stream_failed = true;
                                break;
                            }
                        }
                    }
                };

                match route(&message, config.settings()) {
                    Route::Forward => {
                        let outcome = pipeline.handle(message).await;
                        debug!("Forward outcome: {:?}", outcome);
                    }
                    Route::Command => {
                        handler.handle(&message).await;
                    }
                    Route::Ignore => {}
                }
            }
        }
    }

    // Cleanup
    feed.sync_state();

    let reason = if stream_failed {
        "stopping: the update stream keeps failing"
    } else {
        "shutting down"
    };
    let summary = {
        let state = state.read().await;
        let counters = state.counters();
        let uptime = u64::try_from(state.uptime().num_seconds()).unwrap_or_default();
        format!(
            "🛑 Forward bot is {reason}.\n\n\
             Uptime: {}\n\
             Forwarded: {} | Filtered: {} | Errors: {}",
            format_duration(uptime),
            counters.forwarded,
            counters.filtered,
            counters.errors,
        )
    };
    notify_admin(&bot, admin, &summary).await;

    bot.disconnect();

    if stream_failed {
        bail!("Update stream failed {UPDATE_MAX_FAILURES} times in a row");
    }

    Ok(())
}

/// Initializes the logging subsystem.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Checks that the account can reach a configured group.
async fn verify_group(bot: &TelegramBot, label: &str, chat_id: i64) -> Result<String> {
    match bot.chat_title(chat_id).await {
        Ok(title) => {
            info!("Found {} group: {} ({})", label, title, chat_id);
            Ok(title)
        }
        Err(e) => bail!(
            "Cannot access {label} group {chat_id}: {e}. \
             Make sure this account is a member of the group."
        ),
    }
}

/// Sends a best-effort notification to the admin.
async fn notify_admin(bot: &TelegramBot, admin: i64, text: &str) {
    if let Err(e) = bot.send_text(admin, text).await {
        warn!("Failed to notify admin {}: {}", admin, e);
    }
}

/// Handles Telegram authentication.
async fn authenticate(bot: &TelegramBot, config: &TelegramConfig) -> Result<()> {
    info!("Authentication required");

    let phone: String = if config.phone_number.is_empty() {
        Input::new()
            .with_prompt("Enter your phone number (with country code)")
            .interact_text()?
    } else {
        config.phone_number.clone()
    };

    let token = bot
        .request_login_code(&phone, &config.api_hash)
        .await
        .context("Failed to request login code")?;

    info!("Login code sent to your Telegram app");

    let code: String = Input::new()
        .with_prompt("Enter the login code")
        .interact_text()?;

    match bot.sign_in(&token, &code).await.context("Authentication failed")? {
        SignIn::Complete => {}
        SignIn::PasswordNeeded(password_token) => {
            info!("Two-factor authentication is enabled");
            info!("Password hint: {}", password_token.hint().unwrap_or("no hint"));

            let password: String = Password::new()
                .with_prompt("Enter your 2FA password")
                .interact()?;

            bot.check_password(password_token, &password)
                .await
                .context("2FA authentication failed")?;
        }
    }

    info!("Successfully signed in!");
    Ok(())
}
