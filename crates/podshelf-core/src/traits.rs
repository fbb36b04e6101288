//! Core traits for podshelf abstractions.
//!
//! These traits define the seams between the pipeline and its external
//! collaborators (extraction oracle, transcript source, persisted store),
//! enabling pluggable backends and testability.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// EXTRACTION ORACLE
// =============================================================================

/// Black-box extraction oracle: invoked with system instructions and a user
/// prompt, returns free text expected to parse as a recommendations JSON
/// document. Each call is independent; the oracle has no cross-call memory.
#[async_trait]
pub trait ExtractionOracle: Send + Sync {
    /// Run one completion. Transport and provider failures surface as
    /// `Error::Extraction` / `Error::Request`.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;

    /// Model identifier, recorded with each processed recommendation.
    fn model(&self) -> &str;
}

// =============================================================================
// TRANSCRIPT SOURCE
// =============================================================================

/// External transcript provider for an episode.
///
/// Implementations must distinguish "transcripts disabled" and "not found"
/// from generic transport failures (`Error::TranscriptsDisabled` /
/// `Error::TranscriptUnavailable`); the pipeline branches on these.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the transcript plus, when available, the authoritative video
    /// duration in seconds. Duration absence must not block verification.
    async fn fetch(&self, episode: &Episode) -> Result<(Transcript, Option<u32>)>;
}

// =============================================================================
// REPOSITORIES
// =============================================================================

/// Repository for episode rows and their coarse work-queue status field.
#[async_trait]
pub trait EpisodeRepository: Send + Sync {
    /// Insert an episode if no row with the same source URL exists.
    /// Returns the new ID, or None when the URL was already present.
    async fn insert_if_absent(&self, episode: &Episode) -> Result<Option<Uuid>>;

    /// Fetch a full episode by ID.
    async fn fetch(&self, id: Uuid) -> Result<Episode>;

    /// Claim the oldest pending episode by flipping it to `processing`.
    /// Best-effort: two workers may rarely claim the same episode; outcomes
    /// stay idempotent-ish through dedup-on-URL checks before insert.
    async fn claim_next_pending(&self) -> Result<Option<Episode>>;

    /// Update processing status.
    async fn update_status(&self, id: Uuid, status: EpisodeStatus) -> Result<()>;

    /// Store the verification report on the episode row.
    async fn store_transcript_metadata(&self, id: Uuid, metadata: &JsonValue) -> Result<()>;

    /// Store the extraction run metadata on the episode row.
    async fn store_processing_metadata(&self, id: Uuid, metadata: &JsonValue) -> Result<()>;

    /// Mark the episode completed and stamp `processed_at`.
    async fn mark_completed(&self, id: Uuid) -> Result<()>;

    /// List episodes by status (oldest first).
    async fn list_by_status(&self, status: EpisodeStatus, limit: i64) -> Result<Vec<Episode>>;
}

/// Repository for persisted recommendations.
#[async_trait]
pub trait RecommendationRepository: Send + Sync {
    /// Insert one enriched recommendation.
    async fn insert(&self, rec: &EnrichedRecommendation) -> Result<Uuid>;

    /// List recommendations for one episode.
    async fn list_for_episode(&self, episode_id: Uuid) -> Result<Vec<EnrichedRecommendation>>;

    /// List all book recommendations in persisted insertion order. Input to
    /// the aggregation batch job.
    async fn list_books(&self) -> Result<Vec<EnrichedRecommendation>>;

    /// Delete all recommendations for an episode (reprocessing support).
    async fn delete_for_episode(&self, episode_id: Uuid) -> Result<u64>;
}

/// Repository for canonical book aggregates. The aggregate table is dropped
/// and rebuilt wholesale on each aggregation run.
#[async_trait]
pub trait AggregateRepository: Send + Sync {
    /// Replace all aggregate rows with the freshly computed set, atomically.
    async fn replace_all(&self, aggregates: &[BookAggregate]) -> Result<usize>;

    /// List aggregates ordered by recommendation count (descending).
    async fn list(&self, limit: i64) -> Result<Vec<BookAggregate>>;
}

/// Repository for per-run processing metrics.
#[async_trait]
pub trait MetricsRepository: Send + Sync {
    /// Persist one metric row. Write failures propagate to the caller.
    async fn insert(&self, metric: &ProcessingMetric) -> Result<Uuid>;

    /// All metric rows for an episode, most recent first.
    async fn list_for_episode(&self, episode_id: Uuid) -> Result<Vec<ProcessingMetric>>;

    /// All metric rows for a phase label, most recent first.
    async fn list_for_phase(&self, phase: &str) -> Result<Vec<ProcessingMetric>>;
}
