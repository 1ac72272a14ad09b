//! The forwarding pipeline.
//!
//! Each source-group message goes through the same steps:
//! 1. Gate: dropped silently unless the pipeline is running, the message
//!    comes from the source group, was not sent by this account and was not
//!    written by a bot
//! 2. Length filter on the raw text (counted as filtered)
//! 3. Media policy: with `forward_media` off, media is stripped and the
//!    text still goes out
//! 4. Cleaning (links, mentions, channel references, formatting); nothing
//!    left means filtered
//! 5. Composition with the current reference text and channel button
//! 6. Send to the destination; a failure is counted and logged, never retried
//!
//! State locks are never held across the network call.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info};

use super::PipelineState;
use crate::config::RuntimeConfig;
use crate::telegram::{InboundMessage, Transport};
use crate::text::{clean_message, compose};

/// Why a message never entered the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Stopped,
    OtherChat,
    OwnMessage,
    FromBot,
}

/// Why a message was filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    TooShort { length: usize, min: usize },
    TooLong { length: usize, max: usize },
    OnlyLinks,
}

/// What happened to one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardOutcome {
    Skipped(SkipReason),
    Filtered(FilterReason),
    Forwarded,
    Failed,
}

/// Filters, cleans, annotates and forwards source-group messages.
pub struct ForwardingPipeline<T: Transport> {
    transport: Arc<T>,
    config: RuntimeConfig,
    state: Arc<RwLock<PipelineState>>,
}

impl<T: Transport> ForwardingPipeline<T> {
    /// Creates a pipeline over a shared transport, config and state.
    #[must_use]
    pub fn new(transport: Arc<T>, config: RuntimeConfig, state: Arc<RwLock<PipelineState>>) -> Self {
        Self {
            transport,
            config,
            state,
        }
    }

    /// Processes one inbound message to completion.
    pub async fn handle(&self, message: InboundMessage<T::Media>) -> ForwardOutcome {
        let settings = self.config.settings();

        if !self.state.read().await.is_running() {
            return ForwardOutcome::Skipped(SkipReason::Stopped);
        }
        if message.chat_id != settings.source_group_id {
            return ForwardOutcome::Skipped(SkipReason::OtherChat);
        }
        if message.outgoing {
            return ForwardOutcome::Skipped(SkipReason::OwnMessage);
        }
        if message.sender_is_bot {
            debug!("Message {} skipped: sent by a bot", message.id);
            return ForwardOutcome::Skipped(SkipReason::FromBot);
        }

        let length = message.text.chars().count();
        let too_short = length < settings.min_message_length;
        let too_long = length > settings.max_message_length;
        if too_short || too_long {
            let reason = if too_short {
                FilterReason::TooShort {
                    length,
                    min: settings.min_message_length,
                }
            } else {
                FilterReason::TooLong {
                    length,
                    max: settings.max_message_length,
                }
            };
            return self.filtered(message.id, reason).await;
        }

        let cleaned = clean_message(&message.text);
        if cleaned.is_empty() {
            return self.filtered(message.id, FilterReason::OnlyLinks).await;
        }

        let media = if settings.forward_media {
            message.media
        } else {
            if message.media.is_some() {
                debug!("Message {}: media dropped, forwarding text only", message.id);
            }
            None
        };

        let custom = self.config.customization().await;
        let outbound = compose(&cleaned, &custom.reference_text, &custom.channel_link)
            .with_media(media);

        match self
            .transport
            .send_message(settings.destination_group_id, outbound)
            .await
        {
            Ok(()) => {
                let mut state = self.state.write().await;
                state.record_forwarded();
                info!(
                    "Message {} forwarded. Total: {}",
                    message.id,
                    state.counters().forwarded
                );
                ForwardOutcome::Forwarded
            }
            Err(e) => {
                error!("Failed to forward message {}: {}", message.id, e);
                self.state
                    .write()
                    .await
                    .record_failure(message.id, format!("Message {}: {e}", message.id));
                ForwardOutcome::Failed
            }
        }
    }

    async fn filtered(&self, message_id: i32, reason: FilterReason) -> ForwardOutcome {
        debug!("Message {} filtered: {:?}", message_id, reason);
        self.state.write().await.record_filtered();
        ForwardOutcome::Filtered(reason)
    }

    /// Shared pipeline state.
    #[must_use]
    pub fn state(&self) -> &Arc<RwLock<PipelineState>> {
        &self.state
    }
}

impl<T: Transport> std::fmt::Debug for ForwardingPipeline<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardingPipeline")
            .field("source", &self.config.settings().source_group_id)
            .field("destination", &self.config.settings().destination_group_id)
            .finish_non_exhaustive()
    }
}
