//! Text manipulation utilities shared by extraction and assembly.

use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag regex"));
static ELLIPSIS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{3,}").expect("ellipsis regex"));

/// Collapses runs of whitespace into single spaces and trims.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RE.replace_all(s.trim(), " ").to_string()
}

/// Truncates to at most `max_chars` characters, respecting char boundaries.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

/// Capitalizes the first character and lowercases the rest.
pub fn capitalize_string(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
    }
}

/// Cleans body text for display in the detailed-content section: strips
/// residual HTML tags, unescapes common entities, collapses runaway
/// ellipses and whitespace.
pub fn clean_for_display(content: &str) -> String {
    let content = TAG_RE.replace_all(content, "");
    let content = content
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"");
    let content = ELLIPSIS_RE.replace_all(&content, "...");
    collapse_whitespace(&content)
}

/// Extracts the date part of an ISO-ish timestamp ("2024-01-02T10:00:00" or
/// "2024-01-02 10:00:00" become "2024-01-02"). Returns the input untouched
/// when no time separator is present.
pub fn date_part(timestamp: &str) -> &str {
    timestamp
        .split_once('T')
        .or_else(|| timestamp.split_once(' '))
        .map(|(date, _)| date)
        .unwrap_or(timestamp)
}
