/*!
# Similarity Ranker

Cosine similarity of a query vector against L2-normalized document rows,
with a deterministic top-K: descending score, ties by ascending index.
*/

use super::linalg::l2_norm;
use crate::{LsaError, Result};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A document position and its similarity to the query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub index: usize,
    pub score: f64,
}

/// Cosine similarity of `query` against every row of `documents`
///
/// Rows must already be unit length (or zero). A zero query scores 0.0
/// against every document.
pub fn cosine_similarities(
    query: ArrayView1<f64>,
    documents: ArrayView2<f64>,
) -> Result<Array1<f64>> {
    if query.len() != documents.ncols() {
        return Err(LsaError::dimension(
            "query vector",
            query.len(),
            documents.ncols(),
        ));
    }

    let norm = l2_norm(query);
    if norm == 0.0 || !norm.is_finite() {
        return Ok(Array1::zeros(documents.nrows()));
    }

    let normalized = query.mapv(|v| v / norm);
    Ok(documents.dot(&normalized).mapv(|s| {
        // collapse -0.0 so ties order purely by index
        if s == 0.0 {
            0.0
        } else {
            s.clamp(-1.0, 1.0)
        }
    }))
}

/// The `k` best documents for `query`; returns every document when `k >= n`
pub fn top_k(
    query: ArrayView1<f64>,
    documents: ArrayView2<f64>,
    k: usize,
) -> Result<Vec<ScoredDocument>> {
    let scores = cosine_similarities(query, documents)?;
    Ok(select_top_k(scores.view(), k))
}

/// Order scores descending (ties by ascending index) and keep the first `k`
pub fn select_top_k(scores: ArrayView1<f64>, k: usize) -> Vec<ScoredDocument> {
    let mut ranked: Vec<ScoredDocument> = scores
        .iter()
        .enumerate()
        .map(|(index, &score)| ScoredDocument { index, score })
        .collect();

    let k = k.min(ranked.len());
    if k == 0 {
        return Vec::new();
    }
    if k < ranked.len() {
        ranked.select_nth_unstable_by(k - 1, rank_order);
        ranked.truncate(k);
    }
    ranked.sort_by(rank_order);
    ranked
}

fn rank_order(a: &ScoredDocument, b: &ScoredDocument) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.index.cmp(&b.index))
}
