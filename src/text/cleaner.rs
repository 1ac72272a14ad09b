//! The full cleaning pass applied to source messages.

use super::formatting::tidy_formatting;
use super::references::strip_channel_references;
use super::stripper::strip_links;

/// Removes links, mentions and channel references, then tidies formatting.
///
/// Repeats until the text stops changing, so cleaning an already cleaned
/// text is a no-op.
pub fn clean_message(text: &str) -> String {
    let mut current = text.to_owned();
    loop {
        let next = tidy_formatting(&strip_channel_references(&strip_links(&current)));
        if next == current {
            return next;
        }
        current = next;
    }
}
