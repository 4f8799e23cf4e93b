//! LSA Search Core
//!
//! Latent semantic document search over a fixed in-memory corpus:
//!
//! - Tokenization with lowercase normalization and stopword filtering
//! - TF-IDF term weighting over a vocabulary fixed at build time
//! - Truncated SVD (randomized, seeded) reducing weights to `k` semantic dimensions
//! - Cosine similarity ranking with a deterministic top-K
//!
//! The pipeline is fitted once into an immutable [`SemanticIndex`] which is
//! then shared read-only by every query.
//!
//! # Example
//!
//! ```no_run
//! use lsa_core::*;
//!
//! fn main() -> Result<()> {
//!     let corpus = load_corpus("./corpus")?;
//!     let index = SemanticIndex::build(corpus, StopwordSet::english(), &SearchConfig::default())?;
//!
//!     for hit in index.search("orbital launch windows", 5)? {
//!         println!("{:>6} {:.4} {}", hit.index, hit.rounded_score(), hit.document);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod corpus;
pub mod error;
pub mod index;
pub mod nlp;
pub mod retrieval;
pub mod testing;
pub mod utils;

pub use config::{
    get_env_int, get_env_or, load_env, load_env_from_path, SearchConfig, DEFAULT_COMPONENTS,
    DEFAULT_SEED, DEFAULT_TOP_K,
};
pub use corpus::load_corpus;
pub use error::{LsaError, Result};
pub use index::{IndexStats, SearchHit, SemanticIndex};
pub use nlp::{StopwordSet, Tokenizer};
pub use retrieval::{ScoredDocument, TfIdfVectorizer, TruncatedSvd};
pub use utils::init_logging;
