//! Text helpers for listing output.

/// Returns at most `max_chars` characters of `text`.
///
/// Cuts on character boundaries, never inside a multi-byte sequence.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_unchanged() {
        assert_eq!(truncate_chars("standup", 200), "standup");
        assert_eq!(truncate_chars("", 200), "");
    }

    #[test]
    fn cuts_at_limit() {
        let long = "a".repeat(250);
        assert_eq!(truncate_chars(&long, 200).len(), 200);
        assert_eq!(truncate_chars("abcdef", 3), "abc");
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "ção".repeat(100);
        let cut = truncate_chars(&text, 200);
        assert_eq!(cut.chars().count(), 200);
        assert!(text.starts_with(cut));
    }
}
