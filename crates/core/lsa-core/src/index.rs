//! The immutable semantic index: built once, queried concurrently

use crate::config::SearchConfig;
use crate::nlp::{StopwordSet, Tokenizer};
use crate::retrieval::{linalg, ranker, CsrMatrix, TfIdfVectorizer, TruncatedSvd};
use crate::{LsaError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Projected vectors shorter than this fraction of the leading singular value
/// are treated as zero
const NOISE_FLOOR: f64 = 1e-10;

/// One ranked document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Position of the document in the corpus
    pub index: usize,
    /// Cosine similarity in [-1, 1]
    pub score: f64,
    /// Original document text
    pub document: String,
}

impl SearchHit {
    /// Score rounded to 4 decimal places for display
    pub fn rounded_score(&self) -> f64 {
        (self.score * 10_000.0).round() / 10_000.0
    }
}

/// Summary of a built index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub documents: usize,
    pub vocabulary_size: usize,
    pub components: usize,
    /// Stored entries of the term-weight matrix
    pub nonzero_weights: usize,
    /// Total variance captured by the kept components
    pub explained_variance: f64,
}

/// Corpus, fitted vectorizer and projector, and the normalized semantic matrix
///
/// Nothing here changes after [`SemanticIndex::build`], so a single index can
/// be shared behind an `Arc` by any number of concurrent queries.
#[derive(Debug)]
pub struct SemanticIndex {
    corpus: Vec<String>,
    vectorizer: TfIdfVectorizer,
    weights: CsrMatrix,
    projector: TruncatedSvd,
    /// `(n_docs, k)`, rows unit length (zero for documents without known terms)
    semantic: Array2<f64>,
    /// Norm at or below which a projected vector counts as zero
    zero_floor: f64,
    config: SearchConfig,
}

impl SemanticIndex {
    /// Tokenize, weight and project `corpus`
    ///
    /// Fails with a configuration error when the config is invalid or the
    /// corpus is empty or has no usable terms. No partial index is returned.
    pub fn build(corpus: Vec<String>, stopwords: StopwordSet, config: &SearchConfig) -> Result<Self> {
        config.validate()?;
        if corpus.is_empty() {
            return Err(LsaError::config("cannot build an index from an empty corpus"));
        }

        let started = Instant::now();
        info!(
            "Building semantic index: {} documents, k={}, seed={}",
            corpus.len(),
            config.n_components,
            config.seed
        );

        let tokenizer = Tokenizer::new(stopwords, config.min_token_len);
        let mut vectorizer = TfIdfVectorizer::new(tokenizer);
        let weights = vectorizer.fit(&corpus)?;
        info!(
            "TF-IDF: {} terms, {} non-zero weights ({:?})",
            weights.n_cols(),
            weights.nnz(),
            started.elapsed()
        );

        let svd_started = Instant::now();
        let mut projector = TruncatedSvd::new(config.n_components, config.seed)
            .with_power_iterations(config.n_iter)
            .with_oversamples(config.n_oversamples);
        let mut semantic = projector.fit(&weights).map_err(|e| match e {
            LsaError::Dimension { message, .. } => LsaError::config(message),
            other => other,
        })?;
        let zero_floor =
            NOISE_FLOOR * projector.singular_values().first().copied().unwrap_or(0.0);
        linalg::normalize_rows(&mut semantic, zero_floor);
        info!(
            "Truncated SVD: {} components ({:?})",
            projector.n_components(),
            svd_started.elapsed()
        );

        info!("Semantic index ready in {:?}", started.elapsed());
        Ok(Self {
            corpus,
            vectorizer,
            weights,
            projector,
            semantic,
            zero_floor,
            config: config.clone(),
        })
    }

    /// Top `top_k` documents for `query`; a blank query yields no hits
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let query_vector = self.query_vector(query)?;
        let ranked = ranker::top_k(query_vector.view(), self.semantic.view(), top_k)?;
        debug!(
            "Query {:?}: {} hits in {:?}",
            query,
            ranked.len(),
            started.elapsed()
        );

        Ok(ranked
            .into_iter()
            .map(|scored| SearchHit {
                index: scored.index,
                score: scored.score,
                document: self.corpus[scored.index].clone(),
            })
            .collect())
    }

    /// [`search`](Self::search) with the configured default `top_k`
    pub fn search_default(&self, query: &str) -> Result<Vec<SearchHit>> {
        self.search(query, self.config.top_k)
    }

    /// Project `text` into the semantic space (not normalized)
    ///
    /// A projection within the noise floor comes back as exactly zero.
    fn query_vector(&self, text: &str) -> Result<Array1<f64>> {
        let weights = self.vectorizer.transform(text)?;
        let mut projected = self.projector.transform(&weights)?;
        if linalg::l2_norm(projected.view()) <= self.zero_floor {
            projected.fill(0.0);
        }
        Ok(projected)
    }

    /// Text of document `index`
    pub fn document(&self, index: usize) -> Option<&str> {
        self.corpus.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            documents: self.corpus.len(),
            vocabulary_size: self.vectorizer.vocabulary_size(),
            components: self.projector.n_components(),
            nonzero_weights: self.weights.nnz(),
            explained_variance: self.projector.explained_variance_ratio().iter().sum(),
        }
    }

    #[cfg(test)]
    pub(crate) fn semantic_matrix(&self) -> &Array2<f64> {
        &self.semantic
    }
}
