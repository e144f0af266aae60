//! Text helpers

/// Shorten `title` to at most `max_chars` characters, ending in `…` when cut.
///
/// Counts characters, not bytes, so multi-byte titles are never split.
pub fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() <= max_chars {
        return title.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = title.chars().take(keep).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_titles_untouched() {
        assert_eq!(truncate_title("lecture1.pdf", 80), "lecture1.pdf");
    }

    #[test]
    fn test_long_titles_cut_to_77_plus_ellipsis() {
        let name = "a".repeat(100);
        let cut = truncate_title(&name, 80);
        assert_eq!(cut.chars().count(), 78);
        assert!(cut.ends_with('…'));
        assert!(cut.starts_with(&"a".repeat(77)));
    }

    #[test]
    fn test_multibyte_titles() {
        let name = "자료구조".repeat(30);
        let cut = truncate_title(&name, 80);
        assert_eq!(cut.chars().count(), 78);
    }
}
