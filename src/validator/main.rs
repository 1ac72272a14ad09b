//! Standalone validator for the forward bot's environment configuration.
//!
//! Loads the same variables the bot reads at startup, reports every problem
//! and prints a redacted summary when the configuration is usable.

use std::process::ExitCode;

use clap::Parser;

use telegram_forward_bot::config::{ConfigSummary, Customization, ForwardSettings, TelegramConfig};

/// Environment configuration validator.
#[derive(Parser, Debug)]
#[command(name = "validate_env")]
#[command(about = "Validates the environment configuration of the Telegram forward bot")]
#[command(version)]
struct Args {
    /// Path to the .env file to load before validating.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Print the redacted summary as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        eprintln!("⚠ Could not load {}: {e}", args.env_file);
    }

    let telegram = TelegramConfig::from_env();
    let settings = ForwardSettings::from_env();

    let (telegram, settings) = match (telegram, settings) {
        (Ok(telegram), Ok(settings)) => (telegram, settings),
        (telegram, settings) => {
            if let Err(e) = telegram {
                eprintln!("✗ Telegram credentials: {e}");
            }
            if let Err(e) = settings {
                eprintln!("✗ Forwarding settings: {e}");
            }
            return ExitCode::FAILURE;
        }
    };

    let custom = Customization {
        reference_text: settings.reference_text.clone(),
        channel_link: settings.channel_link.clone(),
    };
    let summary = ConfigSummary::new(&telegram, &settings, &custom);

    if args.json {
        return print_json(&summary);
    }

    print_summary(&summary);
    warn_about_defaults(&settings);

    println!("\n✓ Configuration is valid!");
    ExitCode::SUCCESS
}

fn print_json(summary: &ConfigSummary) -> ExitCode {
    match serde_json::to_string_pretty(summary) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Failed to serialize summary: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_summary(summary: &ConfigSummary) {
    let mark = |ok: bool| if ok { "✓" } else { "✗" };

    println!("Session:            {}", summary.session_name);
    println!("API credentials:    {}", mark(summary.api_configured));
    println!("Phone number:       {}", mark(summary.phone_configured));
    println!("Source group:       {}", summary.source_group_id);
    println!("Destination group:  {}", summary.destination_group_id);
    println!("Admin user:         {}", summary.admin_user_id);
    println!("Reference text:     {}", truncate(&summary.reference_text, 40));
    println!("Channel link:       {}", summary.channel_link);
    println!(
        "Message length:     {}..={} chars",
        summary.min_message_length, summary.max_message_length
    );
    println!("Forward media:      {}", summary.forward_media);
    println!("Log level:          {}", summary.log_level);
}

fn warn_about_defaults(settings: &ForwardSettings) {
    if settings.channel_link.contains("your_channel") {
        println!("\n⚠ CHANNEL_LINK still points at the placeholder channel");
    }
    if settings.reference_text.trim().is_empty() {
        println!("\n⚠ REFERENCE_TEXT is empty; messages are forwarded without a reference");
    }
}

/// Truncates a string for display.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}
