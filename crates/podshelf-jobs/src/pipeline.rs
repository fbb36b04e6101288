//! Per-episode processing pipeline.
//!
//! One episode is processed start to finish sequentially:
//! fetch → verify → extract → enrich → persist → metrics. Data-quality
//! failures are recovered locally into "no result" outcomes; only
//! infrastructure failures mark the episode failed and stop its run.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use podshelf_core::{
    normalize_placeholder, EmptyDetails, EnrichedRecommendation, Episode, EpisodeRepository,
    EpisodeStatus, ExtractedMention, ExtractionOracle, MetricsRepository, PipelineConfig,
    RecommendationDetails, RecommendationKind, RecommendationRepository, Result, TranscriptSource,
};
use podshelf_db::{build_metric, with_store_backoff};
use podshelf_enrich::{EnrichmentOutcome, EnrichmentPipeline, MovieResolver};
use podshelf_extract::{guest_name_from_title, ExtractionDispatcher, TranscriptVerifier};

/// Terminal outcome of one episode run.
#[derive(Debug)]
pub enum ProcessOutcome {
    Completed { recommendations: usize },
    Failed { reason: String },
}

/// Processes one claimed episode through the full pipeline.
pub struct EpisodeProcessor {
    transcripts: Arc<dyn TranscriptSource>,
    oracle: Arc<dyn ExtractionOracle>,
    episodes: Arc<dyn EpisodeRepository>,
    recommendations: Arc<dyn RecommendationRepository>,
    metrics: Arc<dyn MetricsRepository>,
    enrichment: EnrichmentPipeline,
    movies: MovieResolver,
    config: PipelineConfig,
    /// Label recorded on metric rows, grouping runs for comparison.
    phase: String,
}

impl EpisodeProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transcripts: Arc<dyn TranscriptSource>,
        oracle: Arc<dyn ExtractionOracle>,
        episodes: Arc<dyn EpisodeRepository>,
        recommendations: Arc<dyn RecommendationRepository>,
        metrics: Arc<dyn MetricsRepository>,
        enrichment: EnrichmentPipeline,
        movies: MovieResolver,
        config: PipelineConfig,
        phase: impl Into<String>,
    ) -> Self {
        Self {
            transcripts,
            oracle,
            episodes,
            recommendations,
            metrics,
            enrichment,
            movies,
            config,
            phase: phase.into(),
        }
    }

    /// Process one episode. Infrastructure failures mark it `failed` and
    /// surface in the outcome; the metric row is recorded either way.
    pub async fn process(&self, episode: &Episode) -> Result<ProcessOutcome> {
        let start = Instant::now();
        info!(
            episode_id = %episode.id,
            title = %episode.title,
            phase = %self.phase,
            "processing episode"
        );

        match self.run_pipeline(episode, start).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(
                    episode_id = %episode.id,
                    error_msg = %e,
                    "episode failed"
                );
                self.episodes
                    .update_status(episode.id, EpisodeStatus::Failed)
                    .await?;
                let metric = build_metric(
                    episode.id,
                    &self.phase,
                    None,
                    None,
                    &[],
                    self.oracle.model(),
                    start.elapsed().as_secs_f64(),
                    Some(&e.to_string()),
                );
                self.metrics.insert(&metric).await?;
                Ok(ProcessOutcome::Failed {
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn run_pipeline(&self, episode: &Episode, start: Instant) -> Result<ProcessOutcome> {
        // Fetch failures (unavailable, disabled) are terminal for the
        // episode and propagate to the failed path.
        let (transcript, video_duration) = self.transcripts.fetch(episode).await?;

        let report = TranscriptVerifier::new().verify(&transcript, video_duration)?;
        self.episodes
            .store_transcript_metadata(episode.id, &serde_json::to_value(&report)?)
            .await?;

        let speaker_hint = match episode.guest_names.first() {
            Some(name) => name.clone(),
            None => guest_name_from_title(&episode.title),
        };

        let dispatcher = ExtractionDispatcher::new(self.oracle.as_ref(), &self.config);
        let (mentions, run) = dispatcher
            .extract(transcript.text(), &episode.title, &speaker_hint)
            .await?;
        self.episodes
            .store_processing_metadata(episode.id, &serde_json::to_value(&run)?)
            .await?;

        let persisted = self.enrich_and_persist(episode.id, &mentions).await?;

        let metric = build_metric(
            episode.id,
            &self.phase,
            Some(&report),
            Some(&run),
            &mentions,
            self.oracle.model(),
            start.elapsed().as_secs_f64(),
            None,
        );
        self.metrics.insert(&metric).await?;

        self.episodes.mark_completed(episode.id).await?;
        info!(
            episode_id = %episode.id,
            mention_count = mentions.len(),
            persisted,
            duration_ms = start.elapsed().as_millis() as u64,
            "episode completed"
        );
        Ok(ProcessOutcome::Completed {
            recommendations: persisted,
        })
    }

    /// Enrich each mention and persist the survivors. Rejected book matches
    /// are dropped with their reason logged; enrichment transport errors on
    /// one mention never abort the rest.
    async fn enrich_and_persist(
        &self,
        episode_id: Uuid,
        mentions: &[ExtractedMention],
    ) -> Result<usize> {
        let mut persisted = 0;
        for mention in mentions {
            let details = match self.enrich_mention(mention).await {
                Ok(Some(details)) => details,
                Ok(None) => continue,
                Err(e) => {
                    warn!(
                        title = %mention.title,
                        error_msg = %e,
                        "enrichment provider error, skipping mention"
                    );
                    continue;
                }
            };

            let rec = EnrichedRecommendation {
                id: Uuid::now_v7(),
                episode_id,
                kind: mention.kind,
                title: mention.title.trim().to_string(),
                recommendation_context: mention.context.clone(),
                quote_from_episode: mention.quote.clone(),
                timestamp_seconds: mention.timestamp_seconds,
                recommended_by: normalize_placeholder(mention.recommended_by.as_deref()),
                confidence_score: mention.confidence,
                model_used: Some(self.oracle.model().to_string()),
                details,
                created_at: Utc::now(),
            };

            with_store_backoff("insert_recommendation", || async {
                self.recommendations.insert(&rec).await
            })
            .await?;
            persisted += 1;
        }
        Ok(persisted)
    }

    /// Kind-specific enrichment. `None` means the mention is dropped.
    async fn enrich_mention(
        &self,
        mention: &ExtractedMention,
    ) -> Result<Option<RecommendationDetails>> {
        match mention.kind {
            RecommendationKind::Book => match self.enrichment.enrich_book(mention).await? {
                EnrichmentOutcome::Enriched(details) => {
                    Ok(Some(RecommendationDetails::Book(*details)))
                }
                EnrichmentOutcome::Rejected(reason) => {
                    info!(
                        title = %mention.title,
                        reason = reason.as_str(),
                        "book mention dropped"
                    );
                    Ok(None)
                }
            },
            RecommendationKind::Movie | RecommendationKind::TvShow => {
                match self.movies.lookup(&mention.title).await {
                    Ok(Some(details)) => Ok(Some(RecommendationDetails::Movie(details))),
                    Ok(None) => Ok(Some(RecommendationDetails::None(EmptyDetails::default()))),
                    // Movie enrichment is best-effort; keep the mention.
                    Err(e) => {
                        warn!(
                            title = %mention.title,
                            error_msg = %e,
                            "movie enrichment failed, keeping mention unenriched"
                        );
                        Ok(Some(RecommendationDetails::None(EmptyDetails::default())))
                    }
                }
            }
            _ => Ok(Some(RecommendationDetails::None(EmptyDetails::default()))),
        }
    }
}
