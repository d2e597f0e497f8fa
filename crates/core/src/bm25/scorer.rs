//! BM25 Okapi scoring engine.
//!
//! Scores documents against a query using the BM25 formula with configurable
//! `k1` and `b` parameters (see [`crate::config`]). Only documents sharing at
//! least one term with the query are scored; all others are not candidates.

use crate::bm25::inverted_index::InvertedIndex;
use crate::bm25::tokenizer::tokenize;
use crate::config;
use crate::subtitle::EntryId;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// A scored document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub id: EntryId,
    pub score: f32,
}

impl Hit {
    /// Ranking key: higher score first, then lower entry id.
    fn rank_key(&self) -> (OrderedFloat<f32>, Reverse<EntryId>) {
        (OrderedFloat(self.score), Reverse(self.id))
    }
}

/// BM25 Okapi scoring for a query against the inverted index.
///
/// Returns up to `k` hits sorted by descending score. Equal scores are
/// ordered by ascending entry id, so results are stable across runs.
pub fn bm25_search(index: &InvertedIndex, query: &str, k: usize) -> Vec<Hit> {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() || index.is_empty() || k == 0 {
        return Vec::new();
    }

    let avgdl = index.average_doc_length();
    let n = index.doc_count() as f32;
    let k1 = config::BM25_K1;
    let b = config::BM25_B;

    let mut scores: HashMap<u32, f32> = HashMap::with_capacity(64usize.min(index.doc_count()));

    for token in query_tokens.iter() {
        if let Some(postings) = index.postings(token) {
            let df = postings.len() as f32;
            // IDF: log((N - df + 0.5) / (df + 0.5) + 1), always > 0
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();

            for posting in postings {
                let dl = index.doc_length(posting.doc_id).unwrap_or(0) as f32;
                let tf = posting.term_frequency as f32;

                // BM25 score for this term-document pair
                let tf_norm = (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * dl / avgdl));
                let score = idf * tf_norm;

                *scores.entry(posting.doc_id).or_insert(0.0) += score;
            }
        }
    }

    // Partial sort: O(n log k) via min-heap of size k
    let mut heap: BinaryHeap<Reverse<(OrderedFloat<f32>, Reverse<EntryId>)>> =
        BinaryHeap::with_capacity(k + 1);
    for (doc_id, score) in scores {
        let Some(id) = index.doc_key(doc_id) else {
            tracing::warn!(doc_id, "posting without document key, skipping");
            continue;
        };
        heap.push(Reverse(Hit { id, score }.rank_key()));
        if heap.len() > k {
            heap.pop();
        }
    }
    let mut results: Vec<Hit> = heap
        .into_iter()
        .map(|Reverse((score, Reverse(id)))| Hit { id, score: score.0 })
        .collect();
    results.sort_unstable_by(|a, b| b.rank_key().cmp(&a.rank_key()));
    results
}

/// Returns the single best hit scoring above [`config::MIN_MATCH_SCORE`],
/// or `None` when the query shares no term with any document.
pub fn best_match(index: &InvertedIndex, query: &str) -> Option<Hit> {
    bm25_search(index, query, 1)
        .into_iter()
        .next()
        .filter(|hit| hit.score > config::MIN_MATCH_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_corpus() -> InvertedIndex {
        InvertedIndex::build_from_texts([
            (EntryId(0), "rust programming systems language fast"),
            (EntryId(1), "python programming scripting easy"),
            (EntryId(2), "java enterprise programming verbose"),
            (EntryId(3), "rust memory safety zero cost abstractions"),
        ])
        .unwrap()
    }

    fn ids(hits: &[Hit]) -> Vec<u32> {
        hits.iter().map(|h| h.id.0).collect()
    }

    #[test]
    fn test_bm25_empty_query() {
        let idx = build_corpus();
        assert!(bm25_search(&idx, "", 10).is_empty());
        assert!(bm25_search(&idx, "?!...", 10).is_empty());
        assert!(best_match(&idx, "").is_none());
    }

    #[test]
    fn test_bm25_empty_index() {
        let idx = InvertedIndex::default();
        assert!(bm25_search(&idx, "rust", 10).is_empty());
        assert!(best_match(&idx, "rust").is_none());
    }

    #[test]
    fn test_bm25_finds_matching_docs() {
        let idx = build_corpus();
        let results = bm25_search(&idx, "rust", 10);
        assert_eq!(results.len(), 2);
        let ids = ids(&results);
        assert!(ids.contains(&0), "doc 0 contains 'rust'");
        assert!(ids.contains(&3), "doc 3 contains 'rust'");
    }

    #[test]
    fn test_bm25_ranking_order() {
        let idx = InvertedIndex::build_from_texts([
            (EntryId(0), "rust rust rust"), // high TF for "rust"
            (EntryId(1), "rust programming"), // lower TF
        ])
        .unwrap();
        let results = bm25_search(&idx, "rust", 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, EntryId(0), "doc with higher TF should rank first");
    }

    #[test]
    fn test_bm25_rare_terms_weigh_more() {
        let idx = build_corpus();
        // "programming" is in three docs, "safety" in one
        let best = best_match(&idx, "programming safety").unwrap();
        assert_eq!(best.id, EntryId(3));
    }

    #[test]
    fn test_bm25_no_match() {
        let idx = build_corpus();
        assert!(bm25_search(&idx, "nonexistent_xyz_term", 10).is_empty());
        assert!(best_match(&idx, "nonexistent_xyz_term").is_none());
    }

    #[test]
    fn test_bm25_k_truncation() {
        let idx = build_corpus();
        assert_eq!(bm25_search(&idx, "programming", 2).len(), 2);
        assert!(bm25_search(&idx, "programming", 0).is_empty());
    }

    #[test]
    fn test_bm25_scores_positive() {
        let idx = build_corpus();
        let results = bm25_search(&idx, "rust programming", 10);
        for hit in &results {
            assert!(hit.score > 0.0, "BM25 scores should be positive, got {}", hit.score);
        }
    }

    #[test]
    fn test_bm25_ties_break_by_lowest_id() {
        let idx = InvertedIndex::build_from_texts([
            (EntryId(9), "same words here"),
            (EntryId(2), "same words here"),
            (EntryId(5), "same words here"),
        ])
        .unwrap();
        let results = bm25_search(&idx, "words", 10);
        assert_eq!(ids(&results), vec![2, 5, 9]);
        assert_eq!(best_match(&idx, "same").unwrap().id, EntryId(2));

        // Truncation keeps the lowest ids among equal scores
        assert_eq!(ids(&bm25_search(&idx, "here", 2)), vec![2, 5]);
    }

    #[test]
    fn test_bm25_case_and_punctuation_insensitive() {
        let idx = build_corpus();
        let best = best_match(&idx, "PYTHON, Scripting!").unwrap();
        assert_eq!(best.id, EntryId(1));
    }
}
