//! Text normalization for phrase comparison.
//!
//! Phone keyboards love to "help" with typographic punctuation. A user who
//! typed the phrase correctly must not fail because their keyboard produced
//! a curly apostrophe or an em dash.

/// Map one character to its comparison form: typographic quotes and dashes
/// become ASCII, letters are lowercased.
pub fn normalize_char(c: char) -> char {
    match c {
        '\u{2019}' | '\u{2018}' | '`' => '\'',
        '\u{201C}' | '\u{201D}' => '"',
        '\u{2013}' | '\u{2014}' => '-',
        other => other.to_lowercase().next().unwrap_or(other),
    }
}

/// Normalize a whole string: ASCII punctuation, lowercase, trimmed.
pub fn normalize(text: &str) -> String {
    text.trim().chars().map(normalize_char).collect()
}

/// Whether two strings match after normalization.
pub fn matches(typed: &str, target: &str) -> bool {
    normalize(typed) == normalize(target)
}
