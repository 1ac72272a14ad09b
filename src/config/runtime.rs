//! Runtime configuration shared between the pipeline and the admin handler.
//!
//! Startup settings are immutable; only the reference text and the channel
//! link can change while the bot runs. Changes live in memory and are lost on
//! restart.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;
use url::Url;

use super::{ForwardSettings, TelegramConfig};

/// Errors produced when an admin supplies an unusable value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Reference text cannot be empty")]
    EmptyReference,

    #[error("Channel link cannot be empty")]
    EmptyChannelLink,

    #[error("Invalid channel link '{link}': {reason}")]
    InvalidChannelLink { link: String, reason: String },
}

/// Checks that a channel link is an absolute http(s) URL with a host.
pub fn validate_channel_link(link: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidChannelLink {
        link: link.to_owned(),
        reason: reason.to_owned(),
    };

    if link.trim().is_empty() {
        return Err(ValidationError::EmptyChannelLink);
    }

    let url = Url::parse(link).map_err(|e| invalid(&e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(&format!("unsupported scheme '{other}'"))),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host"));
    }

    Ok(())
}

/// The values admins may change at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customization {
    /// Text appended to every forwarded message.
    pub reference_text: String,

    /// Target of the call-to-action button; empty disables the button.
    pub channel_link: String,
}

/// Redacted view of the configuration, safe to show in chat.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub session_name: String,
    pub source_group_id: i64,
    pub destination_group_id: i64,
    pub admin_user_id: i64,
    pub reference_text: String,
    pub channel_link: String,
    pub min_message_length: usize,
    pub max_message_length: usize,
    pub forward_media: bool,
    pub log_level: String,
    pub api_configured: bool,
    pub phone_configured: bool,
}

impl ConfigSummary {
    /// Builds a summary; credentials are reduced to "configured" flags.
    #[must_use]
    pub fn new(telegram: &TelegramConfig, settings: &ForwardSettings, custom: &Customization) -> Self {
        Self {
            session_name: telegram.session_name.clone(),
            source_group_id: settings.source_group_id,
            destination_group_id: settings.destination_group_id,
            admin_user_id: settings.admin_user_id,
            reference_text: custom.reference_text.clone(),
            channel_link: custom.channel_link.clone(),
            min_message_length: settings.min_message_length,
            max_message_length: settings.max_message_length,
            forward_media: settings.forward_media,
            log_level: settings.log_level.clone(),
            api_configured: telegram.api_id > 0 && !telegram.api_hash.is_empty(),
            phone_configured: !telegram.phone_number.is_empty(),
        }
    }
}

/// Cheap-to-clone handle over the process-wide configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    settings: Arc<ForwardSettings>,
    session_name: String,
    api_configured: bool,
    phone_configured: bool,
    custom: Arc<RwLock<Customization>>,
}

impl RuntimeConfig {
    /// Creates the runtime configuration from validated startup settings.
    #[must_use]
    pub fn new(telegram: &TelegramConfig, settings: ForwardSettings) -> Self {
        let custom = Customization {
            reference_text: settings.reference_text.clone(),
            channel_link: settings.channel_link.clone(),
        };
        Self {
            session_name: telegram.session_name.clone(),
            api_configured: telegram.api_id > 0 && !telegram.api_hash.is_empty(),
            phone_configured: !telegram.phone_number.is_empty(),
            settings: Arc::new(settings),
            custom: Arc::new(RwLock::new(custom)),
        }
    }

    /// Creates a runtime configuration without Telegram credentials.
    #[must_use]
    pub fn from_settings(settings: ForwardSettings) -> Self {
        let telegram = TelegramConfig::new(0, String::new(), String::new());
        Self::new(&telegram, settings)
    }

    /// Immutable startup settings.
    #[must_use]
    pub fn settings(&self) -> &ForwardSettings {
        &self.settings
    }

    /// Snapshot of the mutable values.
    pub async fn customization(&self) -> Customization {
        self.custom.read().await.clone()
    }

    /// Replaces the reference text.
    pub async fn update_reference_text(&self, text: &str) -> Result<(), ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyReference);
        }

        self.custom.write().await.reference_text = text.to_owned();
        info!("Reference text updated to: {}", text);
        Ok(())
    }

    /// Replaces the channel link after validating its shape.
    pub async fn update_channel_link(&self, link: &str) -> Result<(), ValidationError> {
        let link = link.trim();
        validate_channel_link(link)?;

        self.custom.write().await.channel_link = link.to_owned();
        info!("Channel link updated to: {}", link);
        Ok(())
    }

    /// Redacted summary for display.
    pub async fn summary(&self) -> ConfigSummary {
        let custom = self.customization().await;
        let settings = &self.settings;
        ConfigSummary {
            session_name: self.session_name.clone(),
            source_group_id: settings.source_group_id,
            destination_group_id: settings.destination_group_id,
            admin_user_id: settings.admin_user_id,
            reference_text: custom.reference_text,
            channel_link: custom.channel_link,
            min_message_length: settings.min_message_length,
            max_message_length: settings.max_message_length,
            forward_media: settings.forward_media,
            log_level: settings.log_level.clone(),
            api_configured: self.api_configured,
            phone_configured: self.phone_configured,
        }
    }
}
