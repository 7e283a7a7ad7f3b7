//! Text processing utilities.

/// Cut `text` to at most `max_chars` characters without splitting one.
///
/// Returns the (possibly shortened) slice and whether anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

/// Single-line preview of `text`, at most `max_chars` characters plus an ellipsis.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match truncate_chars(&flattened, max_chars) {
        (cut, true) => format!("{}...", cut.trim_end()),
        (whole, false) => whole.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), ("abc", true));
        assert_eq!(truncate_chars("abc", 3), ("abc", false));
        assert_eq!(truncate_chars("", 0), ("", false));
        // multi-byte characters are counted once
        assert_eq!(truncate_chars("año ñu", 3), ("año", true));
        assert_eq!(truncate_chars("日本語", 2), ("日本", true));
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("line one\n\n  line two", 100), "line one line two");
        assert_eq!(preview("abcdef ghij", 7), "abcdef...");
    }
}
