//! Classifies inbound messages before any handler sees them.

use crate::config::ForwardSettings;
use crate::telegram::InboundMessage;

/// Where an inbound message goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Source-group traffic, handed to the forwarding pipeline.
    Forward,
    /// A `/command` in a private chat, handed to the admin handler.
    Command,
    Ignore,
}

/// Decides which handler receives `message`.
///
/// Own messages in private chats only count as commands inside the admin's
/// chat, which covers running the bot on the admin's own account (commands
/// typed into Saved Messages).
pub fn route<M>(message: &InboundMessage<M>, settings: &ForwardSettings) -> Route {
    if message.chat_id == settings.source_group_id {
        return Route::Forward;
    }

    let looks_like_command = message.text.trim_start().starts_with('/');
    let own_elsewhere = message.outgoing && message.chat_id != settings.admin_user_id;

    if message.is_private() && looks_like_command && !own_elsewhere {
        Route::Command
    } else {
        Route::Ignore
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ForwardSettings {
        ForwardSettings::new(-100_1, -100_2, 111)
    }

    #[test]
    fn test_source_group_goes_to_pipeline() {
        let msg: InboundMessage = InboundMessage::text(1, -100_1, 5, "/stats");
        assert_eq!(route(&msg, &settings()), Route::Forward);
    }

    #[test]
    fn test_private_command() {
        let msg: InboundMessage = InboundMessage::text(1, 111, 111, "/stats");
        assert_eq!(route(&msg, &settings()), Route::Command);

        // Non-admin commands still reach the handler, which ignores them.
        let msg: InboundMessage = InboundMessage::text(1, 222, 222, "/stats");
        assert_eq!(route(&msg, &settings()), Route::Command);
    }

    #[test]
    fn test_plain_private_text_ignored() {
        let msg: InboundMessage = InboundMessage::text(1, 111, 111, "hello");
        assert_eq!(route(&msg, &settings()), Route::Ignore);
    }

    #[test]
    fn test_group_commands_ignored() {
        let msg: InboundMessage = InboundMessage::text(1, -100_2, 111, "/stop");
        assert_eq!(route(&msg, &settings()), Route::Ignore);
    }

    #[test]
    fn test_own_commands_only_in_admin_chat() {
        let mut msg: InboundMessage = InboundMessage::text(1, 111, 111, "/status");
        msg.outgoing = true;
        assert_eq!(route(&msg, &settings()), Route::Command);

        let mut msg: InboundMessage = InboundMessage::text(1, 333, 111, "/status");
        msg.outgoing = true;
        assert_eq!(route(&msg, &settings()), Route::Ignore);
    }
}
