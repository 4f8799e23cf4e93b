//! Text normalization: tokenizer and stopword filtering

pub mod stopwords;
pub mod tokenizer;

pub use stopwords::{StopwordSet, ENGLISH_STOPWORDS};
pub use tokenizer::Tokenizer;
