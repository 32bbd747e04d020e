use std::sync::LazyLock;

use regex::Regex;

pub const UNKNOWN_YEAR: &str = "Unknown";

static RE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("valid year regex"));

/// First standalone year between 1900 and 2099, in document order.
/// Runs on the raw extracted text, not the normalized form.
pub fn detect_year(raw_text: &str) -> String {
    RE_YEAR
        .find(raw_text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN_YEAR.to_string())
}
