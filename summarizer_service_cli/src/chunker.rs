//! Sentence-aware splitting of long text into bounded chunks.
//!
//! Tokens are whitespace-delimited words. A chunk closes once it holds at
//! least `budget` tokens and its last token ends a sentence, so a chunk may
//! run past the budget rather than cut a sentence in half.

use serde::Serialize;

const SENTENCE_END: [char; 3] = ['.', '!', '?'];

/// A run of consecutive tokens from one text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub text: String,
    pub token_count: usize,
}

impl Chunk {
    fn from_tokens(tokens: &[&str]) -> Self {
        Self {
            text: tokens.join(" "),
            token_count: tokens.len(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Number of whitespace-delimited tokens in `text`.
pub fn token_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn ends_sentence(token: &str) -> bool {
    token.ends_with(SENTENCE_END)
}

/// Splits `text` into chunks of roughly `budget` tokens each.
///
/// A `budget` of zero is treated as one. Empty text yields no chunks.
pub fn split(text: &str, budget: usize) -> Vec<Chunk> {
    let budget = budget.max(1);
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return Vec::new();
    }
    if tokens.len() <= budget {
        return vec![Chunk::from_tokens(&tokens)];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        let running = i + 1 - start;
        if running >= budget && ends_sentence(token) {
            chunks.push(Chunk::from_tokens(&tokens[start..=i]));
            start = i + 1;
        }
    }
    if start < tokens.len() {
        chunks.push(Chunk::from_tokens(&tokens[start..]));
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(Chunk::as_str).collect()
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = split("One two.  Three\nfour", 10);
        assert_eq!(texts(&chunks), vec!["One two. Three four"]);
        assert_eq!(chunks[0].token_count, 4);
    }

    #[test]
    fn test_exact_budget_is_single_chunk() {
        let chunks = split("a b c", 3);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_closes_on_sentence_end_after_budget() {
        let chunks = split("a b. c d e. f g! h", 2);
        assert_eq!(texts(&chunks), vec!["a b.", "c d e.", "f g!", "h"]);
    }

    #[test]
    fn test_runs_past_budget_without_punctuation() {
        let chunks = split("one two three four five. six", 2);
        assert_eq!(texts(&chunks), vec!["one two three four five.", "six"]);
    }

    #[test]
    fn test_sentence_end_before_budget_does_not_close() {
        let chunks = split("a. b. c d. e", 3);
        assert_eq!(texts(&chunks), vec!["a. b. c d.", "e"]);
    }

    #[test]
    fn test_empty_text() {
        assert!(split("", 5).is_empty());
        assert!(split("   \n", 5).is_empty());
    }

    #[test]
    fn test_zero_budget_treated_as_one() {
        let chunks = split("x. y. z", 0);
        assert_eq!(texts(&chunks), vec!["x.", "y.", "z"]);
    }

    #[test]
    fn test_rejoined_chunks_reconstruct_tokens() {
        let text = "  The quick brown fox.  Jumps over\nthe lazy dog! Again? and again and again. tail ";
        for budget in 1..12 {
            let joined = texts(&split(text, budget)).join(" ");
            let expected = text.split_whitespace().collect::<Vec<_>>().join(" ");
            assert_eq!(joined, expected, "budget {}", budget);
        }
    }
}
