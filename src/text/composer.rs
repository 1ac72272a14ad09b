//! Outbound message composition.

/// Label of the call-to-action button attached to forwarded messages.
pub const CHANNEL_BUTTON_LABEL: &str = "🔗 Join Our Channel";

/// Placed between the cleaned text and the reference text.
const REFERENCE_SEPARATOR: &str = " ";

/// An inline URL button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub url: String,
}

/// A message ready to be delivered to the destination group.
///
/// `M` is the transport's opaque media handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage<M = ()> {
    /// Final text, including the reference.
    pub text: String,

    /// Media carried over from the source message, if permitted.
    pub media: Option<M>,

    /// Buttons in display order (one row each).
    pub buttons: Vec<Button>,
}

impl<M> OutboundMessage<M> {
    /// Attaches (or clears) the media handle.
    #[must_use]
    pub fn with_media(self, media: Option<M>) -> Self {
        Self { media, ..self }
    }
}

/// Builds the outbound message for already-cleaned text.
///
/// The reference is omitted when empty, and the channel button is omitted
/// when the link is empty.
pub fn compose<M>(cleaned: &str, reference_text: &str, channel_link: &str) -> OutboundMessage<M> {
    let cleaned = cleaned.trim();
    let reference_text = reference_text.trim();

    let text = match (cleaned.is_empty(), reference_text.is_empty()) {
        (_, true) => cleaned.to_owned(),
        (true, false) => reference_text.to_owned(),
        (false, false) => format!("{cleaned}{REFERENCE_SEPARATOR}{reference_text}"),
    };

    let buttons = if channel_link.trim().is_empty() {
        Vec::new()
    } else {
        vec![Button {
            label: CHANNEL_BUTTON_LABEL.to_owned(),
            url: channel_link.trim().to_owned(),
        }]
    };

    OutboundMessage {
        text,
        media: None,
        buttons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_appends_reference_and_button() {
        let msg: OutboundMessage =
            compose("Check this out and join now!", "📢 via @MyBot", "https://t.me/mychannel");
        assert_eq!(msg.text, "Check this out and join now! 📢 via @MyBot");
        assert_eq!(
            msg.buttons,
            vec![Button {
                label: CHANNEL_BUTTON_LABEL.to_owned(),
                url: "https://t.me/mychannel".to_owned(),
            }]
        );
        assert!(msg.media.is_none());
    }

    #[test]
    fn test_compose_without_reference() {
        let msg: OutboundMessage = compose("Hello there", "", "https://t.me/x");
        assert_eq!(msg.text, "Hello there");
    }

    #[test]
    fn test_compose_without_channel_link() {
        let msg: OutboundMessage = compose("Hello there", "ref", "");
        assert!(msg.buttons.is_empty());
    }

    #[test]
    fn test_compose_empty_text_keeps_reference() {
        let msg: OutboundMessage = compose("", "ref", "");
        assert_eq!(msg.text, "ref");
    }

    #[test]
    fn test_with_media() {
        let msg: OutboundMessage<&str> = compose("a", "b", "");
        assert_eq!(msg.with_media(Some("photo")).media, Some("photo"));
    }
}
