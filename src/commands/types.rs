//! Command types and definitions.

use std::fmt;

/// Admin commands understood by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    /// Start forwarding.
    Start,

    /// Stop forwarding.
    Stop,

    /// Show run state and uptime.
    Status,

    /// Show counters.
    Stats,

    /// Show the redacted configuration.
    Config,

    /// Show recent errors.
    Logs,

    /// Probe connectivity and group access.
    Test,

    /// Zero counters and clear the error log.
    ResetStats,

    /// Replace the reference text (argument may be empty).
    UpdateReference(String),

    /// Replace the channel link (argument may be empty).
    UpdateChannel(String),

    /// Show help information.
    Help,

    /// Anything else starting with `/`.
    Unknown(String),
}

impl AdminCommand {
    /// Parses a command from a message text.
    ///
    /// Returns `None` if the text does not start with `/`. The command word
    /// is case-insensitive and may carry an `@username` suffix.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix('/')?;

        let (word, args) = match rest.split_once(char::is_whitespace) {
            Some((word, args)) => (word, args.trim()),
            None => (rest, ""),
        };

        let word = word
            .split_once('@')
            .map_or(word, |(name, _)| name)
            .to_lowercase();

        let command = match word.as_str() {
            "start" | "start_forwarding" => Self::Start,
            "stop" | "stop_forwarding" => Self::Stop,
            "status" => Self::Status,
            "stats" => Self::Stats,
            "config" => Self::Config,
            "logs" => Self::Logs,
            "test" => Self::Test,
            "reset_stats" => Self::ResetStats,
            "update_reference" => Self::UpdateReference(args.to_owned()),
            "update_channel" => Self::UpdateChannel(args.to_owned()),
            "help" => Self::Help,
            _ => Self::Unknown(format!("/{word}")),
        };

        Some(command)
    }

    /// Returns the command name as it appears in help.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Status => "status",
            Self::Stats => "stats",
            Self::Config => "config",
            Self::Logs => "logs",
            Self::Test => "test",
            Self::ResetStats => "reset_stats",
            Self::UpdateReference(_) => "update_reference",
            Self::UpdateChannel(_) => "update_channel",
            Self::Help => "help",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Returns all available commands grouped for the help text:
    /// `(section, usage, description)`.
    #[must_use]
    pub fn all_commands() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("Control", "/start", "Start message forwarding"),
            ("Control", "/stop", "Stop message forwarding"),
            ("Control", "/test", "Test connection and group access"),
            ("Monitoring", "/status", "Current state and uptime"),
            ("Monitoring", "/stats", "Forwarding statistics"),
            ("Monitoring", "/logs", "Recent errors"),
            ("Monitoring", "/config", "Current configuration"),
            ("Settings", "/update_reference <text>", "Change the reference text"),
            ("Settings", "/update_channel <url>", "Change the channel link"),
            ("Settings", "/reset_stats", "Reset statistics"),
            ("Info", "/help", "Show this help message"),
        ]
    }
}

impl fmt::Display for AdminCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpdateReference(text) => write!(f, "/update_reference {text}"),
            Self::UpdateChannel(link) => write!(f, "/update_channel {link}"),
            Self::Unknown(word) => write!(f, "{word}"),
            _ => write!(f, "/{}", self.name()),
        }
    }
}

/// Result of command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command was successful.
    pub success: bool,

    /// Reply sent to the admin.
    pub message: String,
}

impl CommandResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
