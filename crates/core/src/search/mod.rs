//! Entry matching: resolve a free-text query to the best subtitle entry.
//!
//! [`SubtitleSearch`] is the single capability callers depend on.
//! [`IndexedSubtitle`] implements it with a BM25 [`InvertedIndex`] built over
//! a borrowed [`SubtitleFile`]; hits are re-resolved against that file.
//!
//! Outcomes are kept distinct: `Ok(Some(_))` found, `Ok(None)` no lexical
//! evidence, `Err(_)` the query or index could not be evaluated.

/// Cross-referencing of two subtitle files.
pub mod align;

pub use align::{align, Alignment, AlignmentReport};

use crate::bm25::{best_match, bm25_search, Hit, InvertedIndex};
use crate::config;
use crate::error::{BuildError, RetrievalError};
use crate::subtitle::{Entry, EntryId, SubtitleFile};
use std::collections::HashMap;

/// An entry with the relevance score that selected it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredEntry<'a> {
    pub entry: &'a Entry,
    /// BM25 score (higher = more relevant).
    pub score: f32,
}

/// Search text, get an entry back.
pub trait SubtitleSearch {
    /// Best entry for `query` together with its score, or `None` if no
    /// entry shares a term with the query.
    fn search_scored(&self, query: &str) -> Result<Option<ScoredEntry<'_>>, RetrievalError>;

    /// Best entry for `query`, or `None` if no entry shares a term with it.
    fn search(&self, query: &str) -> Result<Option<&Entry>, RetrievalError> {
        Ok(self.search_scored(query)?.map(|hit| hit.entry))
    }
}

/// A subtitle file paired with the index built from it.
///
/// Immutable after construction. `&IndexedSubtitle` is `Send + Sync`, so
/// any number of threads may query it without locking.
#[derive(Debug)]
pub struct IndexedSubtitle<'a> {
    subtitle: &'a SubtitleFile,
    index: InvertedIndex,
    /// EntryId → position in `subtitle.entries`
    positions: HashMap<EntryId, usize>,
}

impl<'a> IndexedSubtitle<'a> {
    /// Indexes every entry of `subtitle`.
    pub fn new(subtitle: &'a SubtitleFile) -> Result<Self, BuildError> {
        let index = InvertedIndex::build(&subtitle.entries)?;
        let positions = positions(subtitle);
        tracing::debug!(
            entries = subtitle.len(),
            terms = index.term_count(),
            "indexed subtitle"
        );
        Ok(Self {
            subtitle,
            index,
            positions,
        })
    }

    /// Pairs an already built index with the file it claims to describe.
    ///
    /// Fails with [`RetrievalError::CorruptIndex`] if the index is internally
    /// inconsistent or its documents do not correspond one-to-one with the
    /// file's entries.
    pub fn from_parts(
        subtitle: &'a SubtitleFile,
        index: InvertedIndex,
    ) -> Result<Self, RetrievalError> {
        index.validate().map_err(RetrievalError::CorruptIndex)?;
        let positions = positions(subtitle);
        if positions.len() != subtitle.len() {
            return Err(RetrievalError::CorruptIndex(
                "subtitle file contains duplicate entry ids".to_string(),
            ));
        }
        if index.doc_count() != subtitle.len() {
            return Err(RetrievalError::CorruptIndex(format!(
                "index has {} documents, subtitle has {} entries",
                index.doc_count(),
                subtitle.len()
            )));
        }
        if let Some(id) = index.keys().iter().find(|id| !positions.contains_key(*id)) {
            return Err(RetrievalError::UnknownEntry { id: *id });
        }
        Ok(Self {
            subtitle,
            index,
            positions,
        })
    }

    pub fn subtitle(&self) -> &'a SubtitleFile {
        self.subtitle
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    /// Like [`SubtitleSearch::search`], for raw query bytes.
    pub fn search_bytes(&self, query: &[u8]) -> Result<Option<&'a Entry>, RetrievalError> {
        let query = std::str::from_utf8(query)
            .map_err(|e| RetrievalError::InvalidEncoding(e.to_string()))?;
        Ok(self.lookup(query)?.map(|hit| hit.entry))
    }

    /// Up to `k` entries ranked by descending score, ties by ascending id.
    pub fn search_top(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredEntry<'a>>, RetrievalError> {
        check_query(query)?;
        bm25_search(&self.index, query, k)
            .into_iter()
            .filter(|hit| hit.score > config::MIN_MATCH_SCORE)
            .map(|hit| self.resolve(hit))
            .collect()
    }

    fn lookup(&self, query: &str) -> Result<Option<ScoredEntry<'a>>, RetrievalError> {
        check_query(query)?;
        let result = best_match(&self.index, query)
            .map(|hit| self.resolve(hit))
            .transpose()?;
        match &result {
            Some(hit) => tracing::debug!(entry = %hit.entry.id, score = hit.score, "query matched"),
            None => tracing::debug!(query_len = query.len(), "query matched nothing"),
        }
        Ok(result)
    }

    fn resolve(&self, hit: Hit) -> Result<ScoredEntry<'a>, RetrievalError> {
        let entry = self
            .positions
            .get(&hit.id)
            .and_then(|&pos| self.subtitle.entries.get(pos))
            .ok_or(RetrievalError::UnknownEntry { id: hit.id })?;
        Ok(ScoredEntry {
            entry,
            score: hit.score,
        })
    }
}

impl SubtitleSearch for IndexedSubtitle<'_> {
    fn search_scored(&self, query: &str) -> Result<Option<ScoredEntry<'_>>, RetrievalError> {
        self.lookup(query)
    }
}

fn positions(subtitle: &SubtitleFile) -> HashMap<EntryId, usize> {
    subtitle
        .entries
        .iter()
        .enumerate()
        .map(|(pos, e)| (e.id, pos))
        .collect()
}

fn check_query(query: &str) -> Result<(), RetrievalError> {
    if query.len() > config::MAX_QUERY_LEN {
        return Err(RetrievalError::QueryTooLong {
            len: query.len(),
            max: config::MAX_QUERY_LEN,
        });
    }
    Ok(())
}
