//! Configuration module for the forward bot.
//!
//! Handles loading and validation of Telegram credentials and forwarding
//! settings, plus the runtime-mutable reference text and channel link.

mod runtime;
mod settings;

pub use runtime::{ConfigSummary, Customization, RuntimeConfig, ValidationError, validate_channel_link};
pub use settings::{ConfigError, ForwardSettings, TelegramConfig};

/// Default minimum message length in characters.
pub const DEFAULT_MIN_MESSAGE_LENGTH: usize = 10;

/// Default maximum message length in characters.
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 4000;
