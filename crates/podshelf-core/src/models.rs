//! Data models shared across the podshelf pipeline.
//!
//! Construction-to-persistence lifecycle: a [`Transcript`] is built once per
//! episode from the external fetch and never stored directly; only its
//! derived [`TranscriptQualityReport`] is persisted on the episode row.
//! [`ExtractedMention`] values are untrusted oracle output and must pass
//! through placeholder normalization before any downstream use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

// =============================================================================
// TRANSCRIPT
// =============================================================================

/// One time-aligned segment of a fetched transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    /// Start offset of the segment in seconds from the beginning of the video.
    pub start: f64,
    /// Duration of the segment in seconds.
    pub duration: f64,
}

/// A fetched transcript: full text plus its time-ordered segments.
///
/// Immutable after construction.
#[derive(Debug, Clone)]
pub struct Transcript {
    text: String,
    segments: Vec<TranscriptSegment>,
}

impl Transcript {
    /// Build a transcript from its segments, joining segment texts with a
    /// single space (matching the upstream source's flattening).
    pub fn from_segments(segments: Vec<TranscriptSegment>) -> Self {
        let text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self { text, segments }
    }

    /// Build a transcript from raw text with no timing information.
    /// Verification is impossible on such a transcript (zero segments).
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            segments: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn segments(&self) -> &[TranscriptSegment] {
        &self.segments
    }

    /// Total character count of the flattened text.
    pub fn char_count(&self) -> usize {
        self.text.len()
    }

    /// Whitespace-delimited word count of the flattened text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// A detected discontinuity between adjacent transcript segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptGap {
    /// Index of the segment after which the gap occurs.
    pub position: usize,
    /// Length of the gap in seconds.
    pub gap_seconds: f64,
    /// Time at which the gap starts (end of the preceding segment).
    pub time: f64,
}

/// Quality metadata derived from verifying a transcript against an external
/// duration signal. Created once per verification call; attached to the
/// episode row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TranscriptQualityReport {
    pub total_segments: usize,
    pub character_count: usize,
    pub word_count: usize,
    /// Start of the covered time span (first segment start), seconds.
    pub start_time: f64,
    /// End of the covered time span (last segment start + duration), seconds.
    pub end_time: f64,
    pub duration_covered_seconds: f64,
    /// Authoritative video duration, when the external source supplied one.
    pub video_duration_seconds: Option<u32>,
    /// Covered duration as a percentage of the video duration. None when no
    /// external duration is known; never fabricated.
    pub coverage_percent: Option<f64>,
    /// True total number of gaps, which may exceed `gaps.len()`.
    pub gaps_detected: usize,
    pub is_complete: bool,
    /// First gaps, capped for storage.
    pub gaps: Vec<TranscriptGap>,
}

// =============================================================================
// PROCESSING RUN
// =============================================================================

/// How a transcript was dispatched to the extraction oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    SinglePass,
    Chunked,
}

impl ProcessingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMode::SinglePass => "single_pass",
            ProcessingMode::Chunked => "chunked",
        }
    }
}

/// Span bookkeeping for one dispatched chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSpan {
    /// 1-based chunk number.
    pub chunk: usize,
    /// Start offset in the source transcript.
    pub start: usize,
    /// End offset in the source transcript.
    pub end: usize,
    /// Characters actually sent for this chunk.
    pub length: usize,
}

/// Metadata describing one extraction run over a transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessingRun {
    pub mode: ProcessingMode,
    pub total_chunks: usize,
    /// Sum of dispatched chunk lengths. Surfaced as a coverage check, never
    /// silently corrected.
    pub total_characters_sent: usize,
    pub first_chunk_position: usize,
    pub last_chunk_position: usize,
    pub chunks: Vec<ChunkSpan>,
    pub total_mentions_found: usize,
    pub unique_mentions: usize,
}

// =============================================================================
// EXTRACTED MENTIONS
// =============================================================================

/// Kind of thing a mention recommends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Book,
    Movie,
    TvShow,
    Podcast,
    Product,
    App,
    Website,
    Course,
    /// Catch-all; unrecognized type strings from the oracle land here
    /// instead of failing the whole document.
    #[serde(other)]
    Other,
}

impl RecommendationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationKind::Book => "book",
            RecommendationKind::Movie => "movie",
            RecommendationKind::TvShow => "tv_show",
            RecommendationKind::Podcast => "podcast",
            RecommendationKind::Product => "product",
            RecommendationKind::App => "app",
            RecommendationKind::Website => "website",
            RecommendationKind::Course => "course",
            RecommendationKind::Other => "other",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "book" => RecommendationKind::Book,
            "movie" => RecommendationKind::Movie,
            "tv_show" => RecommendationKind::TvShow,
            "podcast" => RecommendationKind::Podcast,
            "product" => RecommendationKind::Product,
            "app" => RecommendationKind::App,
            "website" => RecommendationKind::Website,
            "course" => RecommendationKind::Course,
            _ => RecommendationKind::Other,
        }
    }
}

/// Raw oracle output for one recommendation mention. Untrusted: title and
/// author values may be literal placeholder strings that must be treated as
/// absent before downstream use (see [`normalize_placeholder`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedMention {
    #[serde(rename = "type", default = "default_kind")]
    pub kind: RecommendationKind,
    pub title: String,
    #[serde(default)]
    pub author_creator: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub quote: Option<String>,
    /// Oracle-reported confidence in [0, 1].
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub recommended_by: Option<String>,
    #[serde(default)]
    pub timestamp_seconds: Option<i64>,
}

fn default_kind() -> RecommendationKind {
    RecommendationKind::Other
}

/// Placeholder values the oracle emits when it cannot determine a field.
/// Semantically equivalent to "absent".
pub fn is_placeholder(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    if matches!(
        v.as_str(),
        "" | "not specified" | "not mentioned" | "unknown" | "n/a" | "none" | "host" | "guest"
    ) {
        return true;
    }
    // "Guest 1", "Guest 2", ...
    if let Some(rest) = v.strip_prefix("guest ") {
        if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
            return true;
        }
    }
    false
}

/// Map a possibly-placeholder value to a real value or None.
pub fn normalize_placeholder(value: Option<&str>) -> Option<String> {
    match value {
        Some(v) if !is_placeholder(v) => Some(v.trim().to_string()),
        _ => None,
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// Authoritative bibliographic metadata for one title, as fetched from the
/// external catalog. Immutable for the duration of one enrichment call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanonicalCatalogEntry {
    pub catalog_id: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub authors: Vec<String>,
    pub isbn_10: Option<String>,
    pub isbn_13: Option<String>,
    pub publisher: Option<String>,
    pub published_year: Option<i32>,
    pub page_count: Option<i32>,
    pub description: Option<String>,
    pub categories: Vec<String>,
    /// Cover image resolved through the provider fallback order.
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub info_url: Option<String>,
    /// Heuristic commerce search link; always derivable from title + author.
    pub amazon_url: Option<String>,
}

impl CanonicalCatalogEntry {
    /// Joined author display string ("A, B").
    pub fn author_display(&self) -> Option<String> {
        if self.authors.is_empty() {
            None
        } else {
            Some(self.authors.join(", "))
        }
    }
}

// =============================================================================
// ENRICHED RECOMMENDATIONS
// =============================================================================

/// Book-specific enriched fields. A book record is only created when all
/// mandatory fields (title, author, at least one ISBN) are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetails {
    pub author: String,
    /// Preferred ISBN: ISBN-13 when available, else ISBN-10.
    pub isbn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn_10: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn_13: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amazon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_books_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_books_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    pub verified: bool,
}

/// Movie/TV-specific enriched fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop_url: Option<String>,
}

/// Product/app-specific enriched fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Kind-specific enrichment payload. Serialization flattens the active
/// variant into the record, preserving the flat wire shape without
/// runtime map-merging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecommendationDetails {
    Book(BookDetails),
    Movie(MovieDetails),
    Product(ProductDetails),
    None(EmptyDetails),
}

/// Empty detail payload for kinds with no enrichment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmptyDetails {}

impl RecommendationDetails {
    pub fn as_book(&self) -> Option<&BookDetails> {
        match self {
            RecommendationDetails::Book(b) => Some(b),
            _ => None,
        }
    }
}

/// The persisted recommendation entity: the extracted mention merged with
/// kind-specific enriched detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedRecommendation {
    pub id: Uuid,
    pub episode_id: Uuid,
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation_context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_from_episode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_by: Option<String>,
    pub confidence_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(flatten)]
    pub details: RecommendationDetails,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// AGGREGATES
// =============================================================================

/// Canonical deduplicated book, rebuilt as a batch from all persisted book
/// recommendations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAggregate {
    pub id: Uuid,
    pub isbn: Option<String>,
    pub isbn_10: Option<String>,
    pub isbn_13: Option<String>,
    pub title: String,
    pub author: Option<String>,
    pub cover_image_url: Option<String>,
    pub description: Option<String>,
    pub amazon_url: Option<String>,
    pub google_books_url: Option<String>,
    pub google_books_id: Option<String>,
    pub categories: Vec<String>,
    pub page_count: Option<i32>,
    pub published_year: Option<i32>,
    pub publisher: Option<String>,
    /// Distinct recommender names in order of first appearance.
    pub recommended_by: Vec<String>,
    /// Total contributing recommendation records (not distinct recommenders).
    pub recommendation_count: i32,
    /// Source record IDs for traceability.
    pub recommendation_ids: Vec<Uuid>,
}

// =============================================================================
// EPISODES
// =============================================================================

/// Episode processing lifecycle status. Acts as a coarse work queue across
/// independent workers; a claim race is tolerated, not prevented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl EpisodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeStatus::Pending => "pending",
            EpisodeStatus::Processing => "processing",
            EpisodeStatus::Completed => "completed",
            EpisodeStatus::Failed => "failed",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "processing" => EpisodeStatus::Processing,
            "completed" => EpisodeStatus::Completed,
            "failed" => EpisodeStatus::Failed,
            _ => EpisodeStatus::Pending,
        }
    }
}

/// One podcast episode tracked by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: Uuid,
    pub title: String,
    /// Canonical source URL; uniqueness key for insert-if-absent.
    pub source_url: Option<String>,
    pub duration_seconds: Option<i32>,
    pub guest_names: Vec<String>,
    pub transcript_source: Option<String>,
    pub processing_status: EpisodeStatus,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Persisted TranscriptQualityReport, when verification has run.
    pub transcript_metadata: Option<JsonValue>,
    /// Persisted ProcessingRun, when extraction has run.
    pub processing_metadata: Option<JsonValue>,
}

// =============================================================================
// METRICS
// =============================================================================

/// One per-run quality/cost/performance metric row, recorded after each
/// episode run for offline comparison across processing configurations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessingMetric {
    pub id: Uuid,
    pub episode_id: Uuid,
    pub phase: String,
    pub processing_date: DateTime<Utc>,

    // Transcript quality
    pub total_segments: Option<i32>,
    pub character_count: Option<i64>,
    pub word_count: Option<i64>,
    pub duration_covered_seconds: Option<f64>,
    pub video_duration_seconds: Option<i32>,
    pub coverage_percent: Option<f64>,
    pub gaps_detected: Option<i32>,
    pub is_complete: Option<bool>,

    // Extraction run
    pub processing_mode: Option<String>,
    pub total_chunks: Option<i32>,
    pub total_characters_sent: Option<i64>,
    pub first_chunk_position: Option<i64>,
    pub last_chunk_position: Option<i64>,
    pub coverage_verified: bool,

    // Yield
    pub total_mentions_found: i32,
    pub unique_mentions: i32,
    pub books_found: i32,
    pub movies_found: i32,
    pub products_found: i32,

    // Performance
    pub model_used: String,
    pub estimated_cost: f64,
    pub processing_time_seconds: f64,

    // Error tracking
    pub had_errors: bool,
    pub error_message: Option<String>,
}
