//! Cross-referencing of two subtitle files.
//!
//! Each input entry is matched against a reference file by text. Matched
//! pairs carry the timing difference between the two files; the median of
//! those differences is the offset a caller would apply with
//! [`SubtitleFile::shifted`](crate::subtitle::SubtitleFile::shifted).

use super::SubtitleSearch;
use crate::error::RetrievalError;
use crate::subtitle::{millis_i64, EntryId, SubtitleFile};
use std::time::Duration;
use serde::Serialize;

/// Outcome for one input entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alignment {
    pub input: EntryId,
    /// Matched reference entry, if any scored above the threshold.
    pub reference: Option<EntryId>,
    pub score: Option<f32>,
    /// `reference.start - input.start` in milliseconds.
    pub offset_ms: Option<i64>,
}

/// Per-entry alignments plus summary counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentReport {
    pub alignments: Vec<Alignment>,
    pub matched: usize,
    pub unmatched: usize,
    /// Median offset of matched pairs, `None` when nothing matched.
    pub median_offset_ms: Option<i64>,
}

/// Matches every entry of `input` against `reference`.
///
/// Hits scoring at or below `min_score` count as unmatched. Input entries
/// without text are skipped as unmatched without querying.
pub fn align<S>(
    input: &SubtitleFile,
    reference: &S,
    min_score: f32,
) -> Result<AlignmentReport, RetrievalError>
where
    S: SubtitleSearch + ?Sized,
{
    let mut alignments = Vec::with_capacity(input.len());
    for entry in &input.entries {
        let hit = if entry.is_blank() {
            None
        } else {
            reference
                .search_scored(&entry.text())?
                .filter(|hit| hit.score > min_score)
        };
        alignments.push(match hit {
            Some(hit) => Alignment {
                input: entry.id,
                reference: Some(hit.entry.id),
                score: Some(hit.score),
                offset_ms: Some(offset_ms(entry.start, hit.entry.start)),
            },
            None => Alignment {
                input: entry.id,
                reference: None,
                score: None,
                offset_ms: None,
            },
        });
    }

    let mut offsets: Vec<i64> = alignments.iter().filter_map(|a| a.offset_ms).collect();
    let matched = offsets.len();
    let unmatched = alignments.len() - matched;
    let median_offset_ms = median(&mut offsets);

    tracing::info!(
        matched,
        unmatched,
        median_offset_ms = ?median_offset_ms,
        "aligned subtitle files"
    );

    Ok(AlignmentReport {
        alignments,
        matched,
        unmatched,
        median_offset_ms,
    })
}

/// `reference - input` in milliseconds, saturating at the `i64` range.
fn offset_ms(input: Duration, reference: Duration) -> i64 {
    millis_i64(reference).saturating_sub(millis_i64(input))
}

/// Lower median, so the result is always an observed offset.
fn median(values: &mut [i64]) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    Some(values[(values.len() - 1) / 2])
}
