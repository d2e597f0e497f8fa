//! Global configuration constants for subsync.
//!
//! All scoring parameters and input limits are defined here. These are
//! compile-time constants; runtime configuration is handled via CLI arguments
//! and environment variables in the `subsync` binary.

/// BM25 Okapi term frequency saturation parameter.
///
/// Controls how quickly term frequency saturates. Higher values allow TF to grow more.
/// Standard value is 1.2 (range: 1.0–2.0).
pub const BM25_K1: f32 = 1.2;

/// BM25 Okapi document length normalization parameter.
///
/// Controls the impact of entry length on scoring. 0.0 = no normalization,
/// 1.0 = full normalization. Standard value is 0.75.
pub const BM25_B: f32 = 0.75;

/// Acceptance threshold for a match. A candidate is only returned when its
/// score is strictly greater than this value.
///
/// Every BM25 term contribution is positive, so 0.0 means "at least one
/// shared term".
pub const MIN_MATCH_SCORE: f32 = 0.0;

/// Maximum length of a query in bytes.
pub const MAX_QUERY_LEN: usize = 64 * 1024;

/// Preallocated entry capacity when reading an SRT file.
pub const INITIAL_ENTRIES_CAPACITY: usize = 500;

/// Default acceptance score used when aligning two subtitle files.
///
/// Higher than [`MIN_MATCH_SCORE`] so that one shared common word ("you",
/// "the") does not pair two unrelated lines.
pub const DEFAULT_ALIGN_MIN_SCORE: f32 = 1.0;
