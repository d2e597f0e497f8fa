//! BM25 full-text matching over subtitle entries.
//!
//! Implements Okapi BM25 scoring with an inverted index. Entry text is
//! tokenized by lowercasing and splitting on non-alphanumeric characters.
//! No stemming or stop-word removal is applied.

/// Inverted index data structure with postings lists.
pub mod inverted_index;
/// BM25 Okapi scoring and query execution.
pub mod scorer;
/// Lowercasing word tokenizer.
pub mod tokenizer;

pub use inverted_index::InvertedIndex;
pub use scorer::{best_match, bm25_search, Hit};
pub use tokenizer::tokenize;
