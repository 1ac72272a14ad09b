//! Normalization of shouty formatting.

use lazy_regex::lazy_regex;
use regex::{Captures, Regex};

use super::stripper::collapse_whitespace;

/// Longest run of one punctuation mark or of emoji that is kept.
const MAX_REPEAT: usize = 3;

static RE_EXCLAMATIONS: lazy_regex::Lazy<Regex> = lazy_regex!(r"!{4,}");
static RE_QUESTIONS: lazy_regex::Lazy<Regex> = lazy_regex!(r"\?{4,}");
static RE_DOTS: lazy_regex::Lazy<Regex> = lazy_regex!(r"\.{4,}");

// Emoticons, pictographs and transport symbols
static RE_EMOJI_RUN: lazy_regex::Lazy<Regex> =
    lazy_regex!(r"[\x{1F600}-\x{1F64F}\x{1F300}-\x{1F5FF}\x{1F680}-\x{1F6FF}]{4,}");

static RE_CAPS_RUN: lazy_regex::Lazy<Regex> = lazy_regex!(r"[A-Z]{4,}");

/// Caps punctuation and emoji runs at three, softens all-caps runs and
/// collapses whitespace.
///
/// An all-caps run of four or more letters keeps its first letter and is
/// lowercased after it (`AMAZING` becomes `Amazing`).
pub fn tidy_formatting(text: &str) -> String {
    let out = RE_EXCLAMATIONS.replace_all(text, "!!!");
    let out = RE_QUESTIONS.replace_all(&out, "???");
    let out = RE_DOTS.replace_all(&out, "...");
    let out = RE_EMOJI_RUN.replace_all(&out, |caps: &Captures| {
        caps[0].chars().take(MAX_REPEAT).collect::<String>()
    });
    let out = RE_CAPS_RUN.replace_all(&out, |caps: &Captures| {
        let run = &caps[0];
        let (first, rest) = run.split_at(1);
        format!("{first}{}", rest.to_lowercase())
    });
    collapse_whitespace(&out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caps_punctuation_runs() {
        assert_eq!(tidy_formatting("wow!!!!!!"), "wow!!!");
        assert_eq!(tidy_formatting("what????"), "what???");
        assert_eq!(tidy_formatting("wait......."), "wait...");
        assert_eq!(tidy_formatting("ok!!! fine... sure???"), "ok!!! fine... sure???");
    }

    #[test]
    fn test_caps_emoji_runs() {
        assert_eq!(tidy_formatting("party 🎉🎉🎉🎉🎉🎉"), "party 🎉🎉🎉");
        assert_eq!(tidy_formatting("nice 😀😀😀"), "nice 😀😀😀");
    }

    #[test]
    fn test_softens_all_caps() {
        assert_eq!(tidy_formatting("HUGE SALE TODAY"), "Huge Sale Today");
        assert_eq!(tidy_formatting("the USA and EU"), "the USA and EU");
        assert_eq!(tidy_formatting("iPHONE"), "iPhone");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(tidy_formatting("  a \n b  "), "a b");
    }

    #[test]
    fn test_idempotent() {
        let once = tidy_formatting("HUGE SALE!!!!! 🎉🎉🎉🎉 really?????");
        assert_eq!(once, "Huge Sale!!! 🎉🎉🎉 really???");
        assert_eq!(tidy_formatting(&once), once);
    }
}
