//! Tokenizer: lowercase, split on non-alphabetic boundaries, drop stopwords

use super::StopwordSet;
use once_cell::sync::Lazy;
use regex::Regex;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Alphabetic}+").unwrap());

/// Turns raw text into normalized terms
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stopwords: StopwordSet,
    min_token_len: usize,
}

impl Tokenizer {
    pub fn new(stopwords: StopwordSet, min_token_len: usize) -> Self {
        Self {
            stopwords,
            min_token_len,
        }
    }

    /// English stopwords, tokens of two or more letters
    pub fn english() -> Self {
        Self::new(StopwordSet::english(), 2)
    }

    /// Terms of `text` in order of appearance, duplicates kept
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        WORD_RE
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|word| word.chars().count() >= self.min_token_len)
            .filter(|word| !self.stopwords.contains(word))
            .map(str::to_string)
            .collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::english()
    }
}
