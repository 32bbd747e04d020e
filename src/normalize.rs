/// Collapses every whitespace run into one space and trims the ends.
/// Case and punctuation are kept; this is the form used for previews.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Scoring form of `text`: whitespace collapsed, punctuation removed, lowercased.
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !c.is_ascii_punctuation() && !is_unicode_punctuation(*c))
        .flat_map(char::to_lowercase)
        .collect();
    collapse_whitespace(&stripped)
}

fn is_unicode_punctuation(c: char) -> bool {
    matches!(
        c,
        '\u{2010}'..='\u{2027}' | '\u{2030}'..='\u{205e}' | '\u{00a1}' | '\u{00a7}' | '\u{00ab}'
            | '\u{00b6}' | '\u{00b7}' | '\u{00bb}' | '\u{00bf}'
    )
}

/// First `max_chars` characters of the collapsed text, or the sentinel when
/// nothing readable was extracted.
pub fn preview(text: &str, max_chars: usize) -> String {
    let clean = collapse_whitespace(text);
    if clean.is_empty() {
        return crate::NO_TEXT_EXTRACTED.to_string();
    }
    match clean.char_indices().nth(max_chars) {
        Some((cut, _)) => clean[..cut].to_string(),
        None => clean,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Net\tZero \n\n 2050  "), "Net Zero 2050");
        assert_eq!(collapse_whitespace(" \n\t "), "");
    }

    #[test]
    fn test_normalize_strips_punctuation_and_case() {
        assert_eq!(
            normalize("Scope 1, Scope-2 & “Scope 3” emissions—2023!"),
            "scope 1 scope2 scope 3 emissions2023"
        );
    }

    #[test]
    fn test_normalize_does_not_leave_double_spaces() {
        assert_eq!(normalize("climate - risk"), "climate risk");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "",
            "   ",
            "The Bank's GHG-emissions (Scope 1/2) fell 12.5% in 2022.",
            "Ünïcode Çase  «quoted» text…",
            "already normalized text",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "input: {s:?}");
        }
    }

    #[test]
    fn test_preview_truncates_to_exact_char_count() {
        let text = "é".repeat(2500);
        let p = preview(&text, 2000);
        assert_eq!(p.chars().count(), 2000);
        assert!(text.starts_with(&p));
    }

    #[test]
    fn test_preview_short_text_is_collapsed_only() {
        assert_eq!(preview("Annual\n\nReport", 2000), "Annual Report");
    }

    #[test]
    fn test_preview_sentinel_for_blank_text() {
        assert_eq!(preview("", 2000), "no text extracted");
        assert_eq!(preview(" \n \t", 2000), "no text extracted");
    }
}
