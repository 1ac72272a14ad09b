//! Text transformations applied to forwarded messages.
//!
//! Both stages are pure: [`clean_message`] removes URLs, Telegram links,
//! mentions and channel references and tones down shouty formatting, and
//! [`compose`] turns the cleaned text into an outbound message carrying the
//! reference text and the channel button.

mod cleaner;
mod composer;
mod formatting;
mod references;
mod stripper;

pub use cleaner::clean_message;
pub use composer::{Button, CHANNEL_BUTTON_LABEL, OutboundMessage, compose};
