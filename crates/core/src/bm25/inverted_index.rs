//! Inverted index for BM25 entry matching.
//!
//! Maps terms to postings lists (document ordinal + term frequency). Each
//! subtitle entry becomes exactly one document. Documents are addressed by
//! dense internal u32 ordinals; `doc_keys` maps an ordinal back to the
//! caller's [`EntryId`].
//!
//! The index is built once and never modified afterwards, so a shared
//! reference can be queried from any number of threads.

use crate::bm25::tokenizer::tokenize;
use crate::error::BuildError;
use crate::subtitle::{Entry, EntryId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A single entry in a term's postings list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Internal u32 document ordinal.
    pub doc_id: u32,
    /// Number of times the term appears in this document.
    pub term_frequency: u32,
}

/// Immutable inverted index over one subtitle file.
///
/// Document lengths are tracked for BM25 length normalization.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct InvertedIndex {
    /// term → list of postings, ordered by ascending doc ordinal
    index: HashMap<String, Vec<Posting>>,
    /// internal ordinal → document length (number of tokens)
    doc_lengths: Vec<u32>,
    /// internal ordinal → entry identifier
    doc_keys: Vec<EntryId>,
    /// Sum of all document lengths (for average calculation)
    total_doc_length: u64,
}

impl InvertedIndex {
    /// Builds an index with one document per entry, keyed by the entry id.
    ///
    /// Each document's text is the entry's lines joined by a single space.
    pub fn build<'a, I>(entries: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = &'a Entry>,
    {
        Self::build_from_texts(entries.into_iter().map(|e| (e.id, e.text())))
    }

    /// Builds an index from pre-joined `(id, text)` pairs.
    ///
    /// Fails if an identifier repeats; the partially built index is dropped.
    pub fn build_from_texts<I, S>(docs: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = (EntryId, S)>,
        S: AsRef<str>,
    {
        let docs = docs.into_iter();
        let mut idx = Self {
            doc_lengths: Vec::with_capacity(docs.size_hint().0),
            doc_keys: Vec::with_capacity(docs.size_hint().0),
            ..Self::default()
        };
        let mut seen: HashSet<EntryId> = HashSet::with_capacity(docs.size_hint().0);

        for (key, text) in docs {
            if !seen.insert(key) {
                return Err(BuildError::DuplicateEntryId { id: key });
            }
            let internal_id = u32::try_from(idx.doc_keys.len()).map_err(|_| {
                BuildError::TooManyDocuments {
                    count: idx.doc_keys.len() + 1,
                }
            })?;
            idx.add_document(internal_id, key, text.as_ref());
        }

        tracing::debug!(
            documents = idx.doc_count(),
            terms = idx.term_count(),
            "built inverted index"
        );
        Ok(idx)
    }

    /// Index a document's text under the next internal ordinal.
    fn add_document(&mut self, internal_id: u32, key: EntryId, text: &str) {
        let tokens = tokenize(text);
        let doc_len = tokens.len() as u32;

        self.doc_lengths.push(doc_len);
        self.doc_keys.push(key);
        self.total_doc_length += doc_len as u64;

        // Count term frequencies for this doc
        let mut tf_map: HashMap<&str, u32> = HashMap::new();
        for token in tokens.iter() {
            *tf_map.entry(token).or_insert(0) += 1;
        }

        for (term, tf) in tf_map {
            self.index
                .entry(term.to_string())
                .or_default()
                .push(Posting {
                    doc_id: internal_id,
                    term_frequency: tf,
                });
        }
    }

    /// Postings list for a normalized term.
    pub fn postings(&self, term: &str) -> Option<&[Posting]> {
        self.index.get(term).map(Vec::as_slice)
    }

    /// Entry identifier of an internal document ordinal.
    pub fn doc_key(&self, internal_id: u32) -> Option<EntryId> {
        self.doc_keys.get(internal_id as usize).copied()
    }

    /// Token count of an internal document ordinal.
    pub fn doc_length(&self, internal_id: u32) -> Option<u32> {
        self.doc_lengths.get(internal_id as usize).copied()
    }

    /// Identifiers of all indexed entries, in build order.
    pub fn keys(&self) -> &[EntryId] {
        &self.doc_keys
    }

    /// Number of documents (one per entry, including empty ones).
    pub fn doc_count(&self) -> usize {
        self.doc_keys.len()
    }

    /// Number of distinct terms.
    pub fn term_count(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_keys.is_empty()
    }

    /// Returns the average document length across all indexed documents.
    pub fn average_doc_length(&self) -> f32 {
        if self.doc_keys.is_empty() {
            return 0.0;
        }
        self.total_doc_length as f32 / self.doc_keys.len() as f32
    }

    /// Validate internal invariants.
    ///
    /// Checks that the per-document arrays have equal lengths, that keys are
    /// unique, that postings reference existing documents with nonzero
    /// frequencies, and that the length total matches.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.doc_keys.len();
        if self.doc_lengths.len() != n {
            return Err(format!(
                "doc_lengths length {} != doc_keys length {}",
                self.doc_lengths.len(),
                n
            ));
        }

        let unique: HashSet<&EntryId> = self.doc_keys.iter().collect();
        if unique.len() != n {
            return Err(format!("{} duplicate document keys", n - unique.len()));
        }

        let total: u64 = self.doc_lengths.iter().map(|&l| l as u64).sum();
        if total != self.total_doc_length {
            return Err(format!(
                "total_doc_length {} != sum of doc_lengths {}",
                self.total_doc_length, total
            ));
        }

        for (term, postings) in &self.index {
            for p in postings {
                if p.doc_id as usize >= n {
                    return Err(format!(
                        "posting for {:?} references doc {} (doc_count={})",
                        term, p.doc_id, n
                    ));
                }
                if p.term_frequency == 0 {
                    return Err(format!(
                        "posting for {:?} in doc {} has zero frequency",
                        term, p.doc_id
                    ));
                }
            }
        }

        Ok(())
    }
}
