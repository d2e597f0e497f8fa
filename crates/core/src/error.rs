//! Error types for index construction, retrieval, subtitle I/O and translation.
//!
//! A query that matches nothing is not an error: every search API returns
//! `Ok(None)` for that case.

use crate::subtitle::EntryId;
use thiserror::Error;

/// Index construction could not proceed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Two entries in the same collection share an identifier.
    #[error("duplicate entry id {id} in subtitle collection")]
    DuplicateEntryId { id: EntryId },
    /// The collection has more documents than internal u32 ids can address.
    #[error("too many entries to index: {count}")]
    TooManyDocuments { count: usize },
}

/// A query could not be evaluated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    /// Raw query bytes are not valid UTF-8.
    #[error("query is not valid UTF-8: {0}")]
    InvalidEncoding(String),
    /// Query exceeds [`crate::config::MAX_QUERY_LEN`].
    #[error("query is {len} bytes, maximum is {max}")]
    QueryTooLong { len: usize, max: usize },
    /// Index failed its internal consistency check.
    #[error("index is corrupt: {0}")]
    CorruptIndex(String),
    /// A hit could not be resolved against the entry collection.
    #[error("index references unknown entry {id}")]
    UnknownEntry { id: EntryId },
}

/// Reading, writing or transforming a subtitle file failed.
#[derive(Debug, Error)]
pub enum SubtitleError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("line {line}: invalid entry index {value:?}")]
    InvalidIndex { line: usize, value: String },
    #[error("line {line}: invalid subtitle timestamp {value:?}")]
    InvalidTimestamp { line: usize, value: String },
    #[error("incomplete entry at index {index}")]
    IncompleteEntry { index: u32 },
    #[error("entry {index} ends before it starts")]
    InvertedTiming { index: u32 },
    #[error("scale factor must be finite and non-negative, got {0}")]
    InvalidScale(f64),
}

/// A translation backend failed on one entry.
#[derive(Debug, Error)]
#[error("translation of entry {id} failed: {source}")]
pub struct TranslateError {
    pub id: EntryId,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}
