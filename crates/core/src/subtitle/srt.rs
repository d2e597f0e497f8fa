//! SubRip (`.srt`) reader and writer.
//!
//! An entry is a numeric index line, a `HH:MM:SS,mmm --> HH:MM:SS,mmm`
//! timestamp line, zero or more text lines, and a blank separator line.

use super::{Entry, SubtitleFile, SubtitleReader, SubtitleWriter};
use crate::config;
use crate::error::SubtitleError;
use regex::Regex;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::sync::LazyLock;
use std::time::Duration;

static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2,}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{2,}):(\d{2}):(\d{2})[,.](\d{3})")
        .expect("valid timestamp regex")
});

/// SubRip format adapter. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct SrtFormat;

impl SubtitleReader for SrtFormat {
    fn read<R: Read>(&self, reader: R) -> Result<SubtitleFile, SubtitleError> {
        let mut lines = LineCursor::new(BufReader::new(reader));
        let mut entries = Vec::with_capacity(config::INITIAL_ENTRIES_CAPACITY);
        while let Some(entry) = read_entry(&mut lines)? {
            entries.push(entry);
        }
        tracing::debug!(entries = entries.len(), "parsed SRT stream");
        Ok(SubtitleFile::new(entries))
    }
}

impl SubtitleWriter for SrtFormat {
    fn write<W: Write>(&self, subtitle: &SubtitleFile, writer: W) -> Result<(), SubtitleError> {
        let mut out = BufWriter::new(writer);
        for (i, entry) in subtitle.entries.iter().enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            write_entry(&mut out, entry)?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Writes a single entry without the trailing separator line.
pub fn write_entry<W: Write>(out: &mut W, entry: &Entry) -> Result<(), SubtitleError> {
    writeln!(out, "{}", entry.id)?;
    writeln!(
        out,
        "{} --> {}",
        format_timestamp(entry.start),
        format_timestamp(entry.end)
    )?;
    for line in &entry.lines {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

/// Formats a duration as `HH:MM:SS,mmm`.
pub fn format_timestamp(d: Duration) -> String {
    let total_ms = d.as_millis();
    format!(
        "{:02}:{:02}:{:02},{:03}",
        total_ms / 3_600_000,
        (total_ms % 3_600_000) / 60_000,
        (total_ms % 60_000) / 1000,
        total_ms % 1000
    )
}

/// Parses `HH:MM:SS,mmm --> HH:MM:SS,mmm` into a (start, end) pair.
/// Returns `None` if the line does not contain a timestamp pair or a
/// timestamp does not fit in `u64` milliseconds.
pub fn parse_timestamps(s: &str) -> Option<(Duration, Duration)> {
    let caps = TIMESTAMP_RE.captures(s)?;
    let field = |i: usize| caps[i].parse::<u64>().ok();
    let start = timestamp(field(1)?, field(2)?, field(3)?, field(4)?)?;
    let end = timestamp(field(5)?, field(6)?, field(7)?, field(8)?)?;
    Some((start, end))
}

fn timestamp(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Option<Duration> {
    let ms = hours
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?
        .checked_add(seconds)?
        .checked_mul(1000)?
        .checked_add(millis)?;
    Some(Duration::from_millis(ms))
}

/// Line reader tracking the 1-based line number for error messages.
struct LineCursor<R> {
    inner: R,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> LineCursor<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            line_no: 0,
            buf: String::new(),
        }
    }

    /// Next line without its terminator, or `None` at EOF.
    fn next_line(&mut self) -> Result<Option<String>, SubtitleError> {
        self.buf.clear();
        if self.inner.read_line(&mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        let mut line = self.buf.trim_end_matches(['\n', '\r']);
        if self.line_no == 1 {
            line = line.trim_start_matches('\u{feff}');
        }
        Ok(Some(line.to_string()))
    }
}

/// Reads one entry, or `None` once only blank lines remain.
fn read_entry<R: BufRead>(lines: &mut LineCursor<R>) -> Result<Option<Entry>, SubtitleError> {
    // Skip blank lines before the index
    let index_line = loop {
        match lines.next_line()? {
            None => return Ok(None),
            Some(l) if l.trim().is_empty() => continue,
            Some(l) => break l,
        }
    };
    let index: u32 = index_line
        .trim()
        .parse()
        .map_err(|_| SubtitleError::InvalidIndex {
            line: lines.line_no,
            value: index_line.clone(),
        })?;

    let Some(timing_line) = lines.next_line()? else {
        return Err(SubtitleError::IncompleteEntry { index });
    };
    let (start, end) =
        parse_timestamps(&timing_line).ok_or_else(|| SubtitleError::InvalidTimestamp {
            line: lines.line_no,
            value: timing_line.clone(),
        })?;

    let mut text = Vec::with_capacity(2);
    while let Some(l) = lines.next_line()? {
        if l.trim().is_empty() {
            break;
        }
        text.push(l);
    }

    Entry::new(index, start, end, text).map(Some)
}
