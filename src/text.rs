//! Tokenisation shared by every metric.

pub const DEFAULT_OOV_MARKER: &str = "_OOV";

pub fn whitespace_tokenizer(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Splits a candidate on whitespace runs and drops the OOV marker from any
/// token that ends in it.
pub fn candidate_tokens<'a>(text: &'a str, oov_marker: &str) -> Vec<&'a str> {
    text.split_whitespace()
        .map(|tok| strip_oov(tok, oov_marker))
        .collect()
}

pub fn strip_oov<'a>(token: &'a str, oov_marker: &str) -> &'a str {
    if oov_marker.is_empty() {
        return token;
    }
    token.strip_suffix(oov_marker).unwrap_or(token)
}

/// Collapses whitespace runs to one space and trims the ends.
pub fn normalize_spacing(text: &str) -> String {
    whitespace_tokenizer(text).join(" ")
}

/// Character length as the readability metrics count it: characters of the
/// text minus the token count plus one.
pub fn char_length(text: &str, num_tokens: usize) -> usize {
    (text.chars().count() + 1).saturating_sub(num_tokens)
}
