/*!
# Retrieval Pipeline

TF-IDF term weighting, truncated SVD rank reduction and cosine ranking.
*/

pub mod linalg;
pub mod ranker;
pub mod sparse;
pub mod svd;
pub mod tfidf;

pub use ranker::{cosine_similarities, select_top_k, top_k, ScoredDocument};
pub use sparse::{CsrMatrix, SparseVector};
pub use svd::TruncatedSvd;
pub use tfidf::TfIdfVectorizer;
