//! Centralized default constants for the podshelf pipeline.
//!
//! **This module is the single source of truth** for all shared default values.
//! All crates should reference these constants instead of defining their own
//! magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// TRANSCRIPT VERIFICATION
// =============================================================================

/// Adjacent segments further apart than this are recorded as a gap (seconds).
pub const GAP_TOLERANCE_SECS: f64 = 2.0;

/// Maximum number of gaps stored on a quality report. The true gap count is
/// always reported separately.
pub const MAX_STORED_GAPS: usize = 10;

/// A transcript needs more than this many segments to count as complete.
pub const COMPLETE_MIN_SEGMENTS: usize = 10;

/// A transcript needs more than this many characters to count as complete.
pub const COMPLETE_MIN_CHARS: usize = 1000;

/// A transcript with gaps in more than this fraction of its segments is
/// considered incomplete.
pub const COMPLETE_MAX_GAP_RATIO: f64 = 0.1;

// =============================================================================
// CHUNKING / DISPATCH
// =============================================================================

/// Transcripts shorter than this are extracted in a single oracle call.
pub const SINGLE_PASS_THRESHOLD: usize = 100_000;

/// Maximum characters per chunk when chunked extraction is used.
pub const CHUNK_SIZE: usize = 100_000;

/// Overlap characters between adjacent chunks for context preservation.
pub const CHUNK_OVERLAP: usize = 2_000;

// =============================================================================
// EXTRACTION ORACLE
// =============================================================================

/// Default extraction model name.
pub const ORACLE_MODEL: &str = "claude-sonnet-4-20250514";

/// Default oracle API base URL.
pub const ORACLE_URL: &str = "https://api.anthropic.com";

/// Maximum tokens requested per oracle completion.
pub const ORACLE_MAX_TOKENS: u32 = 4096;

/// Timeout for a single oracle call in seconds.
pub const ORACLE_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// ENRICHMENT
// =============================================================================

/// Default bibliographic catalog base URL (Google Books volumes API).
pub const CATALOG_URL: &str = "https://www.googleapis.com/books/v1/volumes";

/// Number of candidates requested for a title/author catalog search. Only
/// the first is used.
pub const CATALOG_MAX_RESULTS: u32 = 5;

/// Timeout for catalog and movie-metadata requests in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// Timeout for cover-image HEAD validation requests in seconds.
pub const COVER_HEAD_TIMEOUT_SECS: u64 = 5;

/// Minimum accepted title similarity (0-100) between an extracted title and
/// the catalog candidate. Empirically tuned; see PipelineConfig.
pub const TITLE_MATCH_THRESHOLD: u8 = 70;

/// Minimum accepted author similarity (0-100) when an author was extracted.
pub const AUTHOR_MATCH_THRESHOLD: u8 = 60;

/// Default movie-metadata search base URL (TMDB).
pub const MOVIE_API_URL: &str = "https://api.themoviedb.org/3";

// =============================================================================
// COVER IMAGE VALIDATION
// =============================================================================

/// Minimum byte size for an accepted cover image.
pub const COVER_MIN_BYTES: u64 = 10_000;

/// Exact byte size of the commerce provider's known placeholder image.
pub const COVER_PLACEHOLDER_BYTES: u64 = 43;

/// Minimum accepted pixel dimension (width and height) under full validation.
pub const COVER_MIN_DIMENSION: u32 = 100;

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Maximum attempts when retrying a transiently failing store write.
pub const STORE_MAX_RETRIES: u32 = 3;

/// Initial backoff delay for store retries in milliseconds (doubles per
/// attempt).
pub const STORE_RETRY_BASE_MS: u64 = 1_000;

// =============================================================================
// WORKER
// =============================================================================

/// Polling interval when no pending episodes are available (milliseconds).
pub const WORKER_POLL_INTERVAL_MS: u64 = 5_000;

// =============================================================================
// COST ESTIMATION
// =============================================================================

/// Rough characters-per-token ratio used for cost estimates.
pub const CHARS_PER_TOKEN: f64 = 4.0;

/// Estimated USD cost per million input tokens for the default oracle model.
pub const COST_PER_M_INPUT_TOKENS: f64 = 3.0;
