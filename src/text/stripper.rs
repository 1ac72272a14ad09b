//! Link and mention removal.

use lazy_regex::lazy_regex;
use regex::Regex;

// http(s) URLs, including https://t.me/...
static RE_URL: lazy_regex::Lazy<Regex> = lazy_regex!(r"(?i)https?://\S+");

// Scheme-less Telegram links, also when glued to a preceding word
static RE_TELEGRAM_LINK: lazy_regex::Lazy<Regex> =
    lazy_regex!(r"(?i)(?:www\.)?(?:t\.me|telegram\.me|telegram\.dog)/\S*");

// Scheme-less www hosts
static RE_WWW: lazy_regex::Lazy<Regex> = lazy_regex!(r"(?i)www\.\S+");

// Telegram deep links
static RE_DEEP_LINK: lazy_regex::Lazy<Regex> = lazy_regex!(r"(?i)tg://\S+");

// @mentions; `\B` keeps e-mail addresses intact
static RE_MENTION: lazy_regex::Lazy<Regex> = lazy_regex!(r"\B@[A-Za-z0-9_]+\b");

static RE_WHITESPACE: lazy_regex::Lazy<Regex> = lazy_regex!(r"\s+");

/// Removal patterns, applied in order.
fn link_patterns() -> [&'static Regex; 5] {
    [&*RE_URL, &*RE_TELEGRAM_LINK, &*RE_WWW, &*RE_DEEP_LINK, &*RE_MENTION]
}

/// Removes URLs, Telegram links and @mentions, then collapses whitespace.
///
/// Runs until nothing changes, so the result is stable under repeated
/// application even when a removal glues two fragments into a new link.
pub fn strip_links(text: &str) -> String {
    let mut current = strip_once(text);
    loop {
        let next = strip_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_once(text: &str) -> String {
    let mut out = text.to_owned();
    for pattern in link_patterns() {
        if pattern.is_match(&out) {
            out = pattern.replace_all(&out, "").into_owned();
        }
    }
    collapse_whitespace(&out)
}

/// Turns every whitespace run into a single space and trims the ends.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    RE_WHITESPACE.replace_all(text, " ").trim().to_owned()
}
