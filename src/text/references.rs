//! Removal of written-out channel and group references.
//!
//! Catches promotion that avoids links, such as `join: spamname` or
//! `Telegram channel: @spamname`.

use lazy_regex::lazy_regex;
use regex::Regex;

use super::stripper::collapse_whitespace;

// "join: name", "channel : @name", "group:name"
static RE_LABELLED: lazy_regex::Lazy<Regex> =
    lazy_regex!(r"(?i)\b(?:join|channel|group)\s*:\s*@?[A-Za-z0-9_]+");

// "telegram channel: name", "tg group @name"; a bare "telegram group" stays
static RE_PLATFORM: lazy_regex::Lazy<Regex> =
    lazy_regex!(r"(?i)\b(?:telegram|tg)\s*(?:channel|group|chat)\s*(?::\s*@?|@)[A-Za-z0-9_]+");

/// Removes channel and group references, then collapses whitespace.
pub fn strip_channel_references(text: &str) -> String {
    let out = RE_PLATFORM.replace_all(text, "");
    let out = RE_LABELLED.replace_all(&out, "");
    collapse_whitespace(&out)
}
