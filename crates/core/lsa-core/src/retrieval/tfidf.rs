/*!
# TF-IDF Term Weighting

Builds the vocabulary and document-frequency statistics from a corpus and
turns texts into L2-normalized TF-IDF vectors.

Weights follow the smoothed formulation:

```text
idf(t)    = ln((1 + n) / (1 + df(t))) + 1
w(t, d)   = count(t, d) * idf(t), row scaled to unit length
```
*/

use super::sparse::{CsrMatrix, SparseVector};
use crate::nlp::Tokenizer;
use crate::{LsaError, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// TF-IDF vectorizer with a vocabulary fixed at fit time
#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    tokenizer: Tokenizer,
    /// term → column index (columns follow lexicographic term order)
    vocabulary: HashMap<String, usize>,
    /// IDF weight per column
    idf: Vec<f64>,
    n_documents: usize,
    fitted: bool,
}

impl TfIdfVectorizer {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            vocabulary: HashMap::new(),
            idf: Vec::new(),
            n_documents: 0,
            fitted: false,
        }
    }

    /// Learn vocabulary and IDF from `corpus` and return its weight matrix
    ///
    /// Row `i` of the result corresponds to `corpus[i]`. Can only be called once.
    pub fn fit<S: AsRef<str>>(&mut self, corpus: &[S]) -> Result<CsrMatrix> {
        if self.fitted {
            return Err(LsaError::config("vectorizer is already fitted"));
        }
        if corpus.is_empty() {
            return Err(LsaError::config("cannot fit vectorizer on an empty corpus"));
        }

        let tokenized: Vec<Vec<String>> = corpus
            .iter()
            .map(|doc| self.tokenizer.tokenize(doc.as_ref()))
            .collect();

        let terms: BTreeSet<&str> = tokenized
            .iter()
            .flat_map(|tokens| tokens.iter().map(String::as_str))
            .collect();
        if terms.is_empty() {
            return Err(LsaError::config(
                "empty vocabulary: every document is empty or contains only stopwords",
            ));
        }

        let vocabulary: HashMap<String, usize> = terms
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term.to_string(), idx))
            .collect();

        let mut doc_freq = vec![0usize; vocabulary.len()];
        for tokens in &tokenized {
            let unique: HashSet<usize> = tokens.iter().map(|t| vocabulary[t]).collect();
            for idx in unique {
                doc_freq[idx] += 1;
            }
        }

        let n = corpus.len() as f64;
        self.idf = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();
        self.vocabulary = vocabulary;
        self.n_documents = corpus.len();
        self.fitted = true;

        let rows = tokenized
            .iter()
            .map(|tokens| self.weigh(tokens))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            "TF-IDF fitted: {} documents, {} terms",
            self.n_documents,
            self.vocabulary.len()
        );

        CsrMatrix::from_rows(self.vocabulary.len(), &rows)
    }

    /// Weight vector for `text` under the fitted vocabulary
    ///
    /// Unknown terms are ignored. Never mutates the vectorizer.
    pub fn transform(&self, text: &str) -> Result<SparseVector> {
        if !self.fitted {
            return Err(LsaError::config("vectorizer must be fitted before transform"));
        }
        let tokens = self.tokenizer.tokenize(text);
        self.weigh(&tokens)
    }

    fn weigh(&self, tokens: &[String]) -> Result<SparseVector> {
        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for token in tokens {
            if let Some(&idx) = self.vocabulary.get(token) {
                *counts.entry(idx).or_insert(0) += 1;
            }
        }

        let pairs = counts
            .into_iter()
            .map(|(idx, count)| (idx, count as f64 * self.idf[idx]))
            .collect();

        let mut vector = SparseVector::from_pairs(self.idf.len(), pairs)?;
        vector.normalize();
        Ok(vector)
    }

    /// Number of columns of every produced vector
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Column of `term`, if it is in the vocabulary
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// IDF weight of `term`, if it is in the vocabulary
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.term_index(term).map(|idx| self.idf[idx])
    }
}
