use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+\b").expect("valid number pattern"));
static SINGLE_QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'[^']*'").expect("valid single-quote pattern"));
static DOUBLE_QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""[^"]*""#).expect("valid double-quote pattern"));
static IN_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bIN\s*\([^)]+\)").expect("valid IN-list pattern"));

/// Reduce an operation string to its signature so that structurally identical
/// statements with different literals aggregate together.
///
/// Numbers become `?`, quoted strings `'?'` / `"?"`, `IN (...)` lists collapse
/// to `IN (?)`, and runs of whitespace become a single space.
pub fn normalize(operation: &str) -> String {
    let normalized = NUMBER.replace_all(operation, "?");
    let normalized = SINGLE_QUOTED.replace_all(&normalized, "'?'");
    let normalized = DOUBLE_QUOTED.replace_all(&normalized, "\"?\"");
    let normalized = IN_LIST.replace_all(&normalized, "IN (?)");

    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max_chars` characters without splitting a code point.
pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}
