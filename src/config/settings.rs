//! Application settings and Telegram configuration.

use std::path::PathBuf;

use super::runtime::validate_channel_link;
use super::{DEFAULT_MAX_MESSAGE_LENGTH, DEFAULT_MIN_MESSAGE_LENGTH};

/// Telegram API configuration.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Telegram API ID (obtain from <https://my.telegram.org>).
    pub api_id: i32,

    /// Telegram API hash (obtain from <https://my.telegram.org>).
    pub api_hash: String,

    /// Phone number of the account the bot runs as.
    pub phone_number: String,

    /// Session name; the session is stored in `<name>.session`.
    pub session_name: String,
}

fn default_session_name() -> String {
    "telegram_forward_bot".to_owned()
}

impl TelegramConfig {
    /// Creates a new Telegram configuration.
    #[must_use]
    pub fn new(api_id: i32, api_hash: String, phone_number: String) -> Self {
        Self {
            api_id,
            api_hash,
            phone_number,
            session_name: default_session_name(),
        }
    }

    /// Creates configuration from the process environment.
    ///
    /// Expects `API_ID`, `API_HASH` and `PHONE_NUMBER` to be set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_id: i32 = required(&lookup, "API_ID")?
            .parse()
            .map_err(|_| ConfigError::InvalidApiId)?;
        if api_id <= 0 {
            return Err(ConfigError::InvalidApiId);
        }

        let config = Self {
            api_id,
            api_hash: required(&lookup, "API_HASH")?,
            phone_number: required(&lookup, "PHONE_NUMBER")?,
            session_name: lookup("SESSION_NAME")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(default_session_name),
        };

        Ok(config)
    }

    /// Path of the SQLite session file.
    #[must_use]
    pub fn session_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.session", self.session_name))
    }
}

/// Forwarding behaviour and admin settings.
#[derive(Debug, Clone)]
pub struct ForwardSettings {
    /// Group whose messages are republished.
    pub source_group_id: i64,

    /// Group receiving the cleaned messages.
    pub destination_group_id: i64,

    /// The single account allowed to issue admin commands.
    pub admin_user_id: i64,

    /// Initial reference text appended to forwarded messages.
    pub reference_text: String,

    /// Initial channel link for the call-to-action button.
    pub channel_link: String,

    /// Messages shorter than this (in characters) are filtered.
    pub min_message_length: usize,

    /// Messages longer than this (in characters) are filtered.
    pub max_message_length: usize,

    /// Whether media attached to source messages is carried over.
    pub forward_media: bool,

    /// Log level for the application.
    pub log_level: String,

    /// Minimum spacing between outbound sends in milliseconds.
    pub send_interval_ms: u64,
}

fn default_reference_text() -> String {
    "📢 Forwarded by Bot".to_owned()
}

fn default_channel_link() -> String {
    "https://t.me/your_channel".to_owned()
}

fn default_min_length() -> usize {
    DEFAULT_MIN_MESSAGE_LENGTH
}

fn default_max_length() -> usize {
    DEFAULT_MAX_MESSAGE_LENGTH
}

fn default_forward_media() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_send_interval() -> u64 {
    500
}

impl ForwardSettings {
    /// Creates settings for the given groups and admin with defaults elsewhere.
    #[must_use]
    pub fn new(source_group_id: i64, destination_group_id: i64, admin_user_id: i64) -> Self {
        Self {
            source_group_id,
            destination_group_id,
            admin_user_id,
            reference_text: default_reference_text(),
            channel_link: default_channel_link(),
            min_message_length: default_min_length(),
            max_message_length: default_max_length(),
            forward_media: default_forward_media(),
            log_level: default_log_level(),
            send_interval_ms: default_send_interval(),
        }
    }

    /// Loads and validates settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads and validates settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = Self {
            source_group_id: required_number(&lookup, "SOURCE_GROUP_ID")?,
            destination_group_id: required_number(&lookup, "DESTINATION_GROUP_ID")?,
            admin_user_id: required_number(&lookup, "ADMIN_USER_ID")?,
            reference_text: lookup("REFERENCE_TEXT").unwrap_or_else(default_reference_text),
            channel_link: lookup("CHANNEL_LINK")
                .map(|s| s.trim().to_owned())
                .unwrap_or_else(default_channel_link),
            min_message_length: optional_number(&lookup, "MIN_MESSAGE_LENGTH")?
                .unwrap_or_else(default_min_length),
            max_message_length: optional_number(&lookup, "MAX_MESSAGE_LENGTH")?
                .unwrap_or_else(default_max_length),
            forward_media: lookup("FORWARD_MEDIA")
                .map_or_else(default_forward_media, |v| parse_bool(&v)),
            log_level: lookup("LOG_LEVEL")
                .map(|s| s.to_lowercase())
                .unwrap_or_else(default_log_level),
            send_interval_ms: optional_number(&lookup, "SEND_INTERVAL_MS")?
                .unwrap_or_else(default_send_interval),
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Validates cross-field constraints, reporting every problem at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.source_group_id == 0 {
            problems.push("SOURCE_GROUP_ID must be a non-zero integer".to_owned());
        }
        if self.destination_group_id == 0 {
            problems.push("DESTINATION_GROUP_ID must be a non-zero integer".to_owned());
        }
        if self.admin_user_id == 0 {
            problems.push("ADMIN_USER_ID must be a non-zero integer".to_owned());
        }
        if self.source_group_id != 0 && self.source_group_id == self.destination_group_id {
            problems.push("SOURCE_GROUP_ID and DESTINATION_GROUP_ID cannot be the same".to_owned());
        }
        if self.min_message_length > self.max_message_length {
            problems.push(format!(
                "MIN_MESSAGE_LENGTH ({}) cannot exceed MAX_MESSAGE_LENGTH ({})",
                self.min_message_length, self.max_message_length
            ));
        }
        if !self.channel_link.is_empty()
            && let Err(e) = validate_channel_link(&self.channel_link)
        {
            problems.push(format!("CHANNEL_LINK: {e}"));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingEnvVar(key))
}

fn required_number<F, T>(lookup: &F, key: &'static str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let value = required(lookup, key)?;
    value
        .parse()
        .map_err(|_| ConfigError::InvalidNumber { key, value })
}

fn optional_number<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key).map(|v| v.trim().to_owned()) {
        None => Ok(None),
        Some(v) if v.is_empty() => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid API ID format (must be a positive integer)")]
    InvalidApiId,

    #[error("Environment variable {key} must be an integer, got: {value}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("Configuration validation failed:\n{}", bullet_list(.0))]
    Invalid(Vec<String>),
}

fn bullet_list(problems: &[String]) -> String {
    problems
        .iter()
        .map(|p| format!("- {p}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("SOURCE_GROUP_ID", "-1001"),
        ("DESTINATION_GROUP_ID", "-1002"),
        ("ADMIN_USER_ID", "111"),
    ];

    #[test]
    fn test_telegram_config_new() {
        let config = TelegramConfig::new(12345, "abc123".to_owned(), "+100".to_owned());
        assert_eq!(config.api_id, 12345);
        assert_eq!(config.api_hash, "abc123");
        assert_eq!(config.session_path(), PathBuf::from("telegram_forward_bot.session"));
    }

    #[test]
    fn test_telegram_config_missing_hash() {
        let err = TelegramConfig::from_lookup(env(&[("API_ID", "1"), ("PHONE_NUMBER", "+1")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar("API_HASH")));
    }

    #[test]
    fn test_telegram_config_rejects_bad_api_id() {
        let lookup = env(&[("API_ID", "abc"), ("API_HASH", "x"), ("PHONE_NUMBER", "+1")]);
        assert!(matches!(
            TelegramConfig::from_lookup(lookup),
            Err(ConfigError::InvalidApiId)
        ));
    }

    #[test]
    fn test_forward_settings_defaults() {
        let settings = ForwardSettings::from_lookup(env(BASE)).unwrap();
        assert_eq!(settings.source_group_id, -1001);
        assert_eq!(settings.min_message_length, 10);
        assert_eq!(settings.max_message_length, 4000);
        assert!(settings.forward_media);
        assert_eq!(settings.reference_text, "📢 Forwarded by Bot");
        assert_eq!(settings.send_interval_ms, 500);
    }

    #[test]
    fn test_forward_settings_bool_parsing() {
        let mut pairs = BASE.to_vec();
        pairs.push(("FORWARD_MEDIA", "No"));
        assert!(!ForwardSettings::from_lookup(env(&pairs)).unwrap().forward_media);

        let mut pairs = BASE.to_vec();
        pairs.push(("FORWARD_MEDIA", "ON"));
        assert!(ForwardSettings::from_lookup(env(&pairs)).unwrap().forward_media);
    }

    #[test]
    fn test_forward_settings_same_groups() {
        let lookup = env(&[
            ("SOURCE_GROUP_ID", "-5"),
            ("DESTINATION_GROUP_ID", "-5"),
            ("ADMIN_USER_ID", "1"),
        ]);
        let Err(ConfigError::Invalid(problems)) = ForwardSettings::from_lookup(lookup) else {
            panic!("expected validation failure");
        };
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("cannot be the same"));
    }

    #[test]
    fn test_forward_settings_collects_all_problems() {
        let mut settings = ForwardSettings::new(0, 0, 0);
        settings.min_message_length = 50;
        settings.max_message_length = 10;
        settings.channel_link = "not a link".to_owned();

        let Err(ConfigError::Invalid(problems)) = settings.validate() else {
            panic!("expected validation failure");
        };
        assert_eq!(problems.len(), 5);
    }

    #[test]
    fn test_forward_settings_invalid_number() {
        let mut pairs = BASE.to_vec();
        pairs.push(("MIN_MESSAGE_LENGTH", "ten"));
        assert!(matches!(
            ForwardSettings::from_lookup(env(&pairs)),
            Err(ConfigError::InvalidNumber { key: "MIN_MESSAGE_LENGTH", .. })
        ));
    }

    #[test]
    fn test_empty_channel_link_allowed() {
        let mut pairs = BASE.to_vec();
        pairs.push(("CHANNEL_LINK", ""));
        let settings = ForwardSettings::from_lookup(env(&pairs)).unwrap();
        assert!(settings.channel_link.is_empty());
    }
}
