//! Structured logging field name constants for podshelf.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, per-episode completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration (per-mention, per-chunk detail) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "extract", "enrich", "db", "jobs"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "dispatcher", "verifier", "catalog", "cover", "worker"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "extract", "enrich_book", "rebuild_aggregates"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Episode UUID being processed.
pub const EPISODE_ID: &str = "episode_id";

/// Recommendation UUID being operated on.
pub const RECOMMENDATION_ID: &str = "recommendation_id";

/// Title of the mention or catalog entry in play.
pub const TITLE: &str = "title";

/// Processing phase label ("phase_1", "phase_2", ...).
pub const PHASE: &str = "phase";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of chunks dispatched for an episode.
pub const CHUNK_COUNT: &str = "chunk_count";

/// Number of mentions found (before or after dedup, per context).
pub const MENTION_COUNT: &str = "mention_count";

/// Characters sent to the oracle.
pub const CHARS_SENT: &str = "chars_sent";

/// Byte length of an oracle response.
pub const RESPONSE_LEN: &str = "response_len";

/// Similarity score (0-100).
pub const SCORE: &str = "score";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for extraction.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Reason a mention was rejected or a candidate skipped.
pub const REASON: &str = "reason";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
