//! Small text helpers shared by the indexing pipeline and the scorers.

/// Rough token count: whitespace words scaled by 1/0.75.
pub fn estimate_tokens(text: &str) -> usize {
    let word_count = text.split_whitespace().count();
    (word_count as f32 / 0.75) as usize
}

/// Trim `text` to roughly `max_tokens` tokens by dropping trailing words.
/// A budget of `0` leaves the text untouched.
pub fn truncate_to_token_budget(text: &str, max_tokens: usize) -> String {
    if max_tokens == 0 || estimate_tokens(text) <= max_tokens {
        return text.to_string();
    }
    let max_words = ((max_tokens as f32) * 0.75).floor().max(1.0) as usize;
    text.split_whitespace().take(max_words).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_to_token_budget("a  b c", 100), "a  b c");
        assert_eq!(truncate_to_token_budget("a b c", 0), "a b c");
    }

    #[test]
    fn long_text_keeps_leading_words() {
        let text = (0..100).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let cut = truncate_to_token_budget(&text, 8);
        assert_eq!(cut, "w0 w1 w2 w3 w4 w5");
        assert!(estimate_tokens(&cut) <= 8);
    }
}
