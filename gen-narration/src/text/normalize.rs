//! Whitespace trimming and length measurement.

/// Ideographic (full-width) space.
pub const FULL_WIDTH_SPACE: char = '\u{3000}';

/// Strip leading and trailing ASCII and full-width spaces.
///
/// Interior whitespace is kept as-is.
pub fn normalize(text: &str) -> &str {
    text.trim_matches(is_space)
}

fn is_space(c: char) -> bool {
    c.is_whitespace() || c == FULL_WIDTH_SPACE
}

/// Length in Unicode code points.
pub fn code_points(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_ascii_whitespace() {
        assert_eq!(normalize("  \tこんにちは \r\n"), "こんにちは");
    }

    #[test]
    fn test_trims_full_width_space() {
        assert_eq!(normalize("\u{3000}\u{3000}本文\u{3000}"), "本文");
    }

    #[test]
    fn test_keeps_interior_space() {
        assert_eq!(normalize(" 前半\u{3000}後半 "), "前半\u{3000}後半");
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        assert_eq!(normalize(" \u{3000}\t"), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_code_points_not_bytes() {
        assert_eq!(code_points("日本語"), 3);
        assert_eq!("日本語".len(), 9);
        assert_eq!(code_points(""), 0);
    }
}
