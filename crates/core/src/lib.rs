//! # subsync-core
//!
//! Approximate matching of free text against subtitle entries.
//!
//! Given a line believed to correspond to a known moment, find which entry
//! of another subtitle file (and therefore which timestamp) it belongs to,
//! even when the wording differs by omissions, substitutions or rewording.
//!
//! ## Architecture
//!
//! ```text
//! SRT text → SrtFormat → SubtitleFile → InvertedIndex (built once, immutable)
//! query → tokenize → BM25 score → rank (score desc, id asc) → Entry | no match
//! ```
//!
//! Timing transforms, alignment of two files and the translation seam sit
//! around the matcher and never modify an index.

/// BM25 matching: inverted index, Okapi BM25 scoring, and word tokenizer.
pub mod bm25;
/// Global configuration constants: scoring parameters and input limits.
pub mod config;
/// Error types for building, querying, subtitle I/O and translation.
pub mod error;
/// Matcher surface: the `SubtitleSearch` trait, indexed files, and alignment.
pub mod search;
/// Subtitle data model, SRT format adapter, and timing transforms.
pub mod subtitle;
/// Translation interface applied to whole files.
pub mod translate;

pub use error::{BuildError, RetrievalError, SubtitleError, TranslateError};
pub use search::{IndexedSubtitle, ScoredEntry, SubtitleSearch};
pub use subtitle::{Entry, EntryId, SrtFormat, SubtitleFile, SubtitleReader, SubtitleWriter};
