//! Subtitle data model: entries, files and whole-file timing transforms.
//!
//! An [`Entry`] is one numbered line-group with a start/end offset from the
//! beginning of the media. A [`SubtitleFile`] owns its entries. Entries are
//! never mutated after construction; [`SubtitleFile::shifted`] and
//! [`SubtitleFile::scaled`] build new files.

/// SRT reader and writer.
pub mod srt;

pub use srt::SrtFormat;

use crate::error::SubtitleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};
use std::time::Duration;

/// Caller-stable entry identifier (the SRT sequence number).
///
/// Used as the document key of the index. Need not be contiguous or ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u32);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u32> for EntryId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// One subtitle line-group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    #[serde(with = "millis")]
    pub start: Duration,
    #[serde(with = "millis")]
    pub end: Duration,
    /// Text lines in display order.
    pub lines: Vec<String>,
}

impl Entry {
    /// Creates an entry, rejecting `start > end`.
    pub fn new(
        id: impl Into<EntryId>,
        start: Duration,
        end: Duration,
        lines: Vec<String>,
    ) -> Result<Self, SubtitleError> {
        let id = id.into();
        if start > end {
            return Err(SubtitleError::InvertedTiming { index: id.0 });
        }
        Ok(Self {
            id,
            start,
            end,
            lines,
        })
    }

    /// Searchable text: lines joined by a single space, in order.
    pub fn text(&self) -> String {
        self.lines.join(" ")
    }

    /// Returns `true` if the entry has no text lines.
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }
}

/// A parsed subtitle file. Owns its entries exclusively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleFile {
    pub entries: Vec<Entry>,
}

impl SubtitleFile {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up an entry by identifier (linear scan).
    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Returns a copy with every timestamp moved by `offset_ms`.
    /// Timestamps that would become negative are clamped to zero; the
    /// arithmetic saturates at `i64::MAX` milliseconds.
    pub fn shifted(&self, offset_ms: i64) -> SubtitleFile {
        let shift = |d: Duration| -> Duration {
            let ms = millis_i64(d).saturating_add(offset_ms).max(0);
            Duration::from_millis(ms.unsigned_abs())
        };
        let entries = self
            .entries
            .iter()
            .map(|e| Entry {
                id: e.id,
                start: shift(e.start),
                end: shift(e.end),
                lines: e.lines.clone(),
            })
            .collect();
        SubtitleFile { entries }
    }

    /// Returns a copy with every timestamp multiplied by `factor`,
    /// e.g. `25.0 / 23.976` to convert between frame rates.
    pub fn scaled(&self, factor: f64) -> Result<SubtitleFile, SubtitleError> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(SubtitleError::InvalidScale(factor));
        }
        let scale = |d: Duration| Duration::from_millis((d.as_millis() as f64 * factor).round() as u64);
        let entries = self
            .entries
            .iter()
            .map(|e| Entry {
                id: e.id,
                start: scale(e.start),
                end: scale(e.end),
                lines: e.lines.clone(),
            })
            .collect();
        Ok(SubtitleFile { entries })
    }
}

/// Whole milliseconds of `d`, saturating at `i64::MAX`.
pub(crate) fn millis_i64(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

/// Parses a subtitle stream into a [`SubtitleFile`].
pub trait SubtitleReader {
    fn read<R: Read>(&self, reader: R) -> Result<SubtitleFile, SubtitleError>;
}

/// Serializes a [`SubtitleFile`] into a stream.
pub trait SubtitleWriter {
    fn write<W: Write>(&self, subtitle: &SubtitleFile, writer: W) -> Result<(), SubtitleError>;
}

/// Durations as integer milliseconds in serialized output.
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
