//! Small text helpers shared by the prompt builders and parsers.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Opening or closing markdown fence, with an optional `json` tag.
    static ref CODE_FENCE: Regex = Regex::new(r"```(?:json|JSON)?\n?|\n?```").unwrap();
}

/// Remove markdown code fences and surrounding whitespace.
pub fn strip_code_fences(raw: &str) -> String {
    CODE_FENCE.replace_all(raw, "").trim().to_string()
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
