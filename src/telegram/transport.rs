//! The seam between the bot logic and the Telegram network client.

use std::fmt;

use async_trait::async_trait;

use super::TelegramError;
use crate::text::OutboundMessage;

/// A message delivered by the client, already reduced to what the bot needs.
///
/// Chat and user ids use the Bot API convention: users are positive, basic
/// groups negative, supergroups and channels `-100…`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage<M = ()> {
    /// Message id within its chat.
    pub id: i32,

    /// Chat the message was posted in.
    pub chat_id: i64,

    /// Author, when known.
    pub sender_id: Option<i64>,

    /// Whether the author is a bot account.
    pub sender_is_bot: bool,

    /// Whether this account sent the message.
    pub outgoing: bool,

    /// Text or media caption.
    pub text: String,

    /// Opaque media handle.
    pub media: Option<M>,
}

impl<M> InboundMessage<M> {
    /// Creates a text-only message from another user.
    #[must_use]
    pub fn text(id: i32, chat_id: i64, sender_id: i64, text: impl Into<String>) -> Self {
        Self {
            id,
            chat_id,
            sender_id: Some(sender_id),
            sender_is_bot: false,
            outgoing: false,
            text: text.into(),
            media: None,
        }
    }

    /// Attaches a media handle.
    #[must_use]
    pub fn with_media(self, media: M) -> Self {
        Self {
            media: Some(media),
            ..self
        }
    }

    /// Whether the message was posted in a one-to-one chat.
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.chat_id > 0
    }
}

/// Identity of the logged-in account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
}

impl fmt::Display for AccountInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.username {
            Some(username) => write!(f, "{} (@{username})", self.first_name),
            None => write!(f, "{} (id {})", self.first_name, self.id),
        }
    }
}

/// Operations the bot needs from a Telegram client.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opaque media handle carried from inbound to outbound messages.
    type Media: Send + Sync;

    /// Delivers a composed message (text, optional media, buttons) to a chat.
    async fn send_message(
        &self,
        chat_id: i64,
        message: OutboundMessage<Self::Media>,
    ) -> Result<(), TelegramError>;

    /// Sends a plain text message to a chat.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TelegramError>;

    /// Returns the logged-in account; doubles as a connectivity probe.
    async fn whoami(&self) -> Result<AccountInfo, TelegramError>;

    /// Returns the title of a chat the account can access.
    async fn chat_title(&self, chat_id: i64) -> Result<String, TelegramError>;
}
