//! Stopword sets

use crate::Result;
use std::collections::HashSet;
use std::path::Path;

/// English stopword list (NLTK `stopwords.words('english')`)
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

/// A fixed set of lowercase words removed during tokenization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopwordSet {
    words: HashSet<String>,
}

impl StopwordSet {
    /// Empty set: every token is kept
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in English list
    pub fn english() -> Self {
        Self::from_words(ENGLISH_STOPWORDS.iter().copied())
    }

    /// Build from any list of words; entries are trimmed and lowercased
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// Load a stopword file: one word per line, blank lines and `#` comments skipped
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let set = Self::from_words(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        );
        tracing::debug!(
            "Loaded {} stopwords from {}",
            set.len(),
            path.as_ref().display()
        );
        Ok(set)
    }

    /// Whether `word` (already lowercased) is a stopword
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_english_list() {
        let set = StopwordSet::english();
        assert_eq!(set.len(), 179);
        assert!(set.contains("the"));
        assert!(set.contains("wouldn't"));
        assert!(!set.contains("cat"));
    }

    #[test]
    fn test_from_words_normalizes() {
        let set = StopwordSet::from_words(["The", " ON ", "", "and"]);
        assert_eq!(set.len(), 3);
        assert!(set.contains("the"));
        assert!(set.contains("on"));
    }

    #[test]
    fn test_from_file_skips_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# custom list").unwrap();
        writeln!(file, "alpha").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "Beta").unwrap();

        let set = StopwordSet::from_file(file.path()).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("beta"));
        assert!(!set.contains("# custom list"));
    }

    #[test]
    fn test_from_missing_file() {
        let err = StopwordSet::from_file("/nonexistent/stopwords.txt").unwrap_err();
        assert!(matches!(err, crate::LsaError::Io(_)));
    }
}
