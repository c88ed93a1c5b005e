//! Clause formatting: wrap one clause into length-bounded line fragments.

use super::clause::Clause;
use super::normalize::{code_points, normalize};
use super::tokenizer::{Tokenizer, tokenize};

/// A trailing remainder of at most this many code points is merged into the
/// previous fragment instead of becoming its own line.
pub const MERGE_THRESHOLD: usize = 10;

/// Format one clause into line fragments of at most `max_length` code points.
///
/// The clause's trailing mark, if any, is reattached to the last fragment
/// only. A fragment can exceed `max_length` in two cases: a single token is
/// longer than the limit, or a short remainder was merged into it.
pub fn format_clause(
    clause: Clause<'_>,
    max_length: usize,
    tokenizer: &dyn Tokenizer,
) -> Vec<String> {
    let body = normalize(clause.body());

    match (body.is_empty(), clause.mark) {
        (true, None) => Vec::new(),
        (true, Some(mark)) => vec![mark.as_str().to_string()],
        (false, mark) => {
            let mut fragments = wrap_tokens(&tokenize(tokenizer, body), max_length);
            if fragments.is_empty() {
                fragments.push(body.to_string());
            }
            if let (Some(mark), Some(last)) = (mark, fragments.last_mut()) {
                last.push_str(mark.as_str());
            }
            fragments
        }
    }
}

/// Greedy line filling with the short-remainder merge rule.
fn wrap_tokens(tokens: &[String], max_length: usize) -> Vec<String> {
    let lengths: Vec<usize> = tokens.iter().map(|t| code_points(t)).collect();
    // Code points not yet placed on a line, including the current token
    let mut remaining: usize = lengths.iter().sum();

    let mut fragments = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for (i, (token, &token_len)) in tokens.iter().zip(&lengths).enumerate() {
        if !current.is_empty() && current_len + token_len > max_length {
            if remaining <= MERGE_THRESHOLD {
                current.push_str(&tokens[i..].concat());
                break;
            }
            fragments.push(std::mem::take(&mut current));
            current_len = 0;
        }

        current.push_str(token);
        current_len += token_len;
        remaining -= token_len;
    }

    if !current.is_empty() {
        fragments.push(current);
    }
    fragments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::clause::{ClauseMark, Clauses};
    use crate::text::tokenizer::Token;

    /// Splits on '/', dropping the slashes, and brackets the result with
    /// boundary markers.
    struct SlashTokenizer;

    impl Tokenizer for SlashTokenizer {
        fn analyze(&self, text: &str) -> Vec<Token> {
            let mut tokens = vec![Token::marker("BOS/EOS")];
            tokens.extend(text.split('/').map(Token::word));
            tokens.push(Token::marker("BOS/EOS"));
            tokens
        }

        fn name(&self) -> &'static str {
            "slash"
        }
    }

    /// Produces nothing, as an analyzer does for input it cannot segment.
    struct SilentTokenizer;

    impl Tokenizer for SilentTokenizer {
        fn analyze(&self, _text: &str) -> Vec<Token> {
            vec![Token::marker("EOS")]
        }

        fn name(&self) -> &'static str {
            "silent"
        }
    }

    fn format_with(text: &str, max_length: usize, tokenizer: &dyn Tokenizer) -> Vec<String> {
        Clauses::new(text)
            .flat_map(|clause| format_clause(clause, max_length, tokenizer))
            .collect()
    }

    fn format(text: &str, max_length: usize) -> Vec<String> {
        format_with(text, max_length, &SlashTokenizer)
    }

    #[test]
    fn test_short_clause_single_fragment() {
        assert_eq!(format("これは/テスト/です。", 20), vec!["これはテストです。"]);
    }

    #[test]
    fn test_fills_up_to_max_length() {
        // 5 + 5 fits exactly in 10
        assert_eq!(
            format("あいうえお/かきくけこ/さしすせそたちつてとな", 10),
            vec!["あいうえおかきくけこ", "さしすせそたちつてとな"]
        );
    }

    #[test]
    fn test_merge_at_threshold() {
        // Remainder is exactly 10 code points: merged, line exceeds max_length
        assert_eq!(
            format("あいうえお/かきくけこさしすせそ。", 5),
            vec!["あいうえおかきくけこさしすせそ。"]
        );
    }

    #[test]
    fn test_no_merge_above_threshold() {
        // Remainder is 11 code points: flushed as its own line
        assert_eq!(
            format("あいうえお/かきくけこさしすせそた。", 5),
            vec!["あいうえお", "かきくけこさしすせそた。"]
        );
    }

    #[test]
    fn test_merge_sums_all_remaining_tokens() {
        assert_eq!(
            format("あいうえお/かきく/けこさ/しすせそ", 5),
            vec!["あいうえおかきくけこさしすせそ"]
        );
        assert_eq!(
            format("あいうえお/かきく/けこさ/しすせそた", 5),
            vec!["あいうえお", "かきくけこさしすせそた"]
        );
    }

    #[test]
    fn test_long_single_token_not_split() {
        assert_eq!(format("とてもながいたんご", 3), vec!["とてもながいたんご"]);
    }

    #[test]
    fn test_mark_on_last_fragment_only() {
        let fragments = format(
            "あいうえおかきくけこ/さしすせそたちつてとな/にぬねのはまみむめもや、",
            10,
        );
        assert_eq!(
            fragments,
            vec![
                "あいうえおかきくけこ",
                "さしすせそたちつてとな",
                "にぬねのはまみむめもや、"
            ]
        );
    }

    #[test]
    fn test_lone_mark() {
        assert_eq!(format("。", 20), vec!["。"]);
        assert_eq!(format(" 、 ", 20), vec!["、"]);
        assert_eq!(format("\u{3000}。", 20), vec!["。"]);
    }

    #[test]
    fn test_whitespace_only_clause() {
        assert!(format("", 20).is_empty());
        assert!(format(" \u{3000} ", 20).is_empty());
    }

    #[test]
    fn test_space_before_mark_is_trimmed() {
        assert_eq!(format("  おわり \u{3000}。", 20), vec!["おわり。"]);
    }

    #[test]
    fn test_unsegmentable_falls_back_to_text() {
        assert_eq!(format_with("※※※", 20, &SilentTokenizer), vec!["※※※"]);
        assert_eq!(format_with(" ※※※。", 20, &SilentTokenizer), vec!["※※※。"]);
    }

    #[test]
    fn test_markers_do_not_count_toward_length() {
        // "BOS/EOS" markers would add 7 code points each if counted
        assert_eq!(format("あいう/えお", 5), vec!["あいうえお"]);
    }

    #[test]
    fn test_uses_clause_mark() {
        let clause = Clause {
            text: "よろしく、",
            mark: Some(ClauseMark::Comma),
        };
        assert_eq!(format_clause(clause, 20, &SlashTokenizer), vec!["よろしく、"]);
    }

    #[test]
    fn test_long_clause_wraps_in_linear_time() {
        let text = vec!["あいうえお"; 100_000].join("/");
        let start = std::time::Instant::now();

        let fragments = format(&text, 20);

        assert_eq!(fragments.len(), 25_000);
        assert!(fragments.iter().all(|f| code_points(f) == 20));
        assert!(start.elapsed() < std::time::Duration::from_secs(10));
    }
}
