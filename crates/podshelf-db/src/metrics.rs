//! Processing metrics: per-run recording and phase comparison.
//!
//! Recording is pure bookkeeping. The recorder derives coverage
//! verification and per-type yield counts from the run's artifacts; a
//! write failure propagates to the caller but never undoes the extraction
//! that already completed.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use tracing::info;
use uuid::Uuid;

use podshelf_core::{
    defaults, Error, ExtractedMention, MetricsRepository, ProcessingMetric, ProcessingRun,
    RecommendationKind, Result, TranscriptQualityReport,
};

/// Estimated input cost in USD for a run that sent this many characters.
pub fn estimate_cost(chars_sent: usize) -> f64 {
    chars_sent as f64 / defaults::CHARS_PER_TOKEN / 1_000_000.0 * defaults::COST_PER_M_INPUT_TOKENS
}

/// Build one metric row from a run's artifacts.
#[allow(clippy::too_many_arguments)]
pub fn build_metric(
    episode_id: Uuid,
    phase: &str,
    report: Option<&TranscriptQualityReport>,
    run: Option<&ProcessingRun>,
    mentions: &[ExtractedMention],
    model: &str,
    processing_time_seconds: f64,
    error_message: Option<&str>,
) -> ProcessingMetric {
    let coverage_verified = match (report, run) {
        (Some(report), Some(run)) => report.character_count == run.total_characters_sent,
        _ => false,
    };

    let count_kind = |kind: RecommendationKind| -> i32 {
        mentions.iter().filter(|m| m.kind == kind).count() as i32
    };

    let chars_sent = run.map(|r| r.total_characters_sent).unwrap_or(0);

    ProcessingMetric {
        id: Uuid::now_v7(),
        episode_id,
        phase: phase.to_string(),
        processing_date: Utc::now(),

        total_segments: report.map(|r| r.total_segments as i32),
        character_count: report.map(|r| r.character_count as i64),
        word_count: report.map(|r| r.word_count as i64),
        duration_covered_seconds: report.map(|r| r.duration_covered_seconds),
        video_duration_seconds: report.and_then(|r| r.video_duration_seconds.map(|d| d as i32)),
        coverage_percent: report.and_then(|r| r.coverage_percent),
        gaps_detected: report.map(|r| r.gaps_detected as i32),
        is_complete: report.map(|r| r.is_complete),

        processing_mode: run.map(|r| r.mode.as_str().to_string()),
        total_chunks: run.map(|r| r.total_chunks as i32),
        total_characters_sent: run.map(|r| r.total_characters_sent as i64),
        first_chunk_position: run.map(|r| r.first_chunk_position as i64),
        last_chunk_position: run.map(|r| r.last_chunk_position as i64),
        coverage_verified,

        total_mentions_found: run.map(|r| r.total_mentions_found as i32).unwrap_or(0),
        unique_mentions: mentions.len() as i32,
        books_found: count_kind(RecommendationKind::Book),
        // TV shows count with movies; both go through the same enrichment.
        movies_found: count_kind(RecommendationKind::Movie)
            + count_kind(RecommendationKind::TvShow),
        products_found: count_kind(RecommendationKind::Product),

        model_used: model.to_string(),
        estimated_cost: estimate_cost(chars_sent),
        processing_time_seconds,

        had_errors: error_message.is_some(),
        error_message: error_message.map(String::from),
    }
}

/// Aggregated view over one phase's metric rows, for offline comparison of
/// processing configurations.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSummary {
    pub phase: String,
    pub episodes: usize,
    pub avg_unique_mentions: f64,
    pub avg_books_found: f64,
    pub avg_estimated_cost: f64,
    pub avg_processing_time_seconds: f64,
    pub complete_transcript_rate: f64,
    pub error_rate: f64,
}

/// Summarize a phase's rows. Rates are 0 when there are no rows.
pub fn summarize_phase(phase: &str, rows: &[ProcessingMetric]) -> PhaseSummary {
    let n = rows.len();
    let avg = |f: &dyn Fn(&ProcessingMetric) -> f64| -> f64 {
        if n == 0 {
            0.0
        } else {
            rows.iter().map(f).sum::<f64>() / n as f64
        }
    };

    PhaseSummary {
        phase: phase.to_string(),
        episodes: n,
        avg_unique_mentions: avg(&|m| m.unique_mentions as f64),
        avg_books_found: avg(&|m| m.books_found as f64),
        avg_estimated_cost: avg(&|m| m.estimated_cost),
        avg_processing_time_seconds: avg(&|m| m.processing_time_seconds),
        complete_transcript_rate: avg(&|m| if m.is_complete == Some(true) { 1.0 } else { 0.0 }),
        error_rate: avg(&|m| if m.had_errors { 1.0 } else { 0.0 }),
    }
}

/// PostgreSQL implementation of MetricsRepository.
pub struct PgMetricsRepository {
    pool: Pool<Postgres>,
}

impl PgMetricsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Summaries for two phase labels, for side-by-side comparison.
    pub async fn compare_phases(&self, a: &str, b: &str) -> Result<(PhaseSummary, PhaseSummary)> {
        let rows_a = self.list_for_phase(a).await?;
        let rows_b = self.list_for_phase(b).await?;
        Ok((summarize_phase(a, &rows_a), summarize_phase(b, &rows_b)))
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> ProcessingMetric {
        ProcessingMetric {
            id: row.get("id"),
            episode_id: row.get("episode_id"),
            phase: row.get("phase"),
            processing_date: row.get("processing_date"),
            total_segments: row.get("total_segments"),
            character_count: row.get("character_count"),
            word_count: row.get("word_count"),
            duration_covered_seconds: row.get("duration_covered_seconds"),
            video_duration_seconds: row.get("video_duration_seconds"),
            coverage_percent: row.get("coverage_percent"),
            gaps_detected: row.get("gaps_detected"),
            is_complete: row.get("is_complete"),
            processing_mode: row.get("processing_mode"),
            total_chunks: row.get("total_chunks"),
            total_characters_sent: row.get("total_characters_sent"),
            first_chunk_position: row.get("first_chunk_position"),
            last_chunk_position: row.get("last_chunk_position"),
            coverage_verified: row.get("coverage_verified"),
            total_mentions_found: row.get("total_mentions_found"),
            unique_mentions: row.get("unique_mentions"),
            books_found: row.get("books_found"),
            movies_found: row.get("movies_found"),
            products_found: row.get("products_found"),
            model_used: row.get("model_used"),
            estimated_cost: row.get("estimated_cost"),
            processing_time_seconds: row.get("processing_time_seconds"),
            had_errors: row.get("had_errors"),
            error_message: row.get("error_message"),
        }
    }
}

#[async_trait]
impl MetricsRepository for PgMetricsRepository {
    async fn insert(&self, metric: &ProcessingMetric) -> Result<Uuid> {
        sqlx::query(
            "INSERT INTO processing_metrics
                 (id, episode_id, phase, processing_date,
                  total_segments, character_count, word_count,
                  duration_covered_seconds, video_duration_seconds,
                  coverage_percent, gaps_detected, is_complete,
                  processing_mode, total_chunks, total_characters_sent,
                  first_chunk_position, last_chunk_position, coverage_verified,
                  total_mentions_found, unique_mentions, books_found,
                  movies_found, products_found, model_used, estimated_cost,
                  processing_time_seconds, had_errors, error_message)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                     $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24,
                     $25, $26, $27, $28)",
        )
        .bind(metric.id)
        .bind(metric.episode_id)
        .bind(&metric.phase)
        .bind(metric.processing_date)
        .bind(metric.total_segments)
        .bind(metric.character_count)
        .bind(metric.word_count)
        .bind(metric.duration_covered_seconds)
        .bind(metric.video_duration_seconds)
        .bind(metric.coverage_percent)
        .bind(metric.gaps_detected)
        .bind(metric.is_complete)
        .bind(&metric.processing_mode)
        .bind(metric.total_chunks)
        .bind(metric.total_characters_sent)
        .bind(metric.first_chunk_position)
        .bind(metric.last_chunk_position)
        .bind(metric.coverage_verified)
        .bind(metric.total_mentions_found)
        .bind(metric.unique_mentions)
        .bind(metric.books_found)
        .bind(metric.movies_found)
        .bind(metric.products_found)
        .bind(&metric.model_used)
        .bind(metric.estimated_cost)
        .bind(metric.processing_time_seconds)
        .bind(metric.had_errors)
        .bind(&metric.error_message)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        info!(
            subsystem = "metrics",
            episode_id = %metric.episode_id,
            phase = %metric.phase,
            unique_mentions = metric.unique_mentions,
            coverage_verified = metric.coverage_verified,
            "Metric recorded"
        );
        Ok(metric.id)
    }

    async fn list_for_episode(&self, episode_id: Uuid) -> Result<Vec<ProcessingMetric>> {
        let rows = sqlx::query(
            "SELECT * FROM processing_metrics
             WHERE episode_id = $1
             ORDER BY processing_date DESC",
        )
        .bind(episode_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.into_iter().map(Self::parse_row).collect())
    }

    async fn list_for_phase(&self, phase: &str) -> Result<Vec<ProcessingMetric>> {
        let rows = sqlx::query(
            "SELECT * FROM processing_metrics
             WHERE phase = $1
             ORDER BY processing_date DESC",
        )
        .bind(phase)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.into_iter().map(Self::parse_row).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podshelf_core::{ChunkSpan, ProcessingMode};

    fn report(chars: usize) -> TranscriptQualityReport {
        TranscriptQualityReport {
            total_segments: 100,
            character_count: chars,
            word_count: chars / 5,
            start_time: 0.0,
            end_time: 3600.0,
            duration_covered_seconds: 3600.0,
            video_duration_seconds: Some(3600),
            coverage_percent: Some(100.0),
            gaps_detected: 0,
            is_complete: true,
            gaps: vec![],
        }
    }

    fn run(chars_sent: usize) -> ProcessingRun {
        ProcessingRun {
            mode: ProcessingMode::SinglePass,
            total_chunks: 1,
            total_characters_sent: chars_sent,
            first_chunk_position: 0,
            last_chunk_position: 0,
            chunks: vec![ChunkSpan {
                chunk: 1,
                start: 0,
                end: chars_sent,
                length: chars_sent,
            }],
            total_mentions_found: 3,
            unique_mentions: 3,
        }
    }

    fn mention(kind: RecommendationKind) -> ExtractedMention {
        ExtractedMention {
            kind,
            title: "T".into(),
            author_creator: None,
            context: None,
            quote: None,
            confidence: 0.9,
            recommended_by: None,
            timestamp_seconds: None,
        }
    }

    #[test]
    fn test_coverage_verified_requires_exact_match() {
        let m = build_metric(
            Uuid::nil(),
            "baseline",
            Some(&report(50_000)),
            Some(&run(50_000)),
            &[],
            "m",
            1.0,
            None,
        );
        assert!(m.coverage_verified);

        let m = build_metric(
            Uuid::nil(),
            "baseline",
            Some(&report(50_000)),
            Some(&run(51_000)),
            &[],
            "m",
            1.0,
            None,
        );
        assert!(!m.coverage_verified);
    }

    #[test]
    fn test_per_type_counts() {
        let mentions = vec![
            mention(RecommendationKind::Book),
            mention(RecommendationKind::Book),
            mention(RecommendationKind::Movie),
            mention(RecommendationKind::Product),
            mention(RecommendationKind::Podcast),
        ];
        let m = build_metric(
            Uuid::nil(),
            "baseline",
            None,
            Some(&run(1_000)),
            &mentions,
            "m",
            1.0,
            None,
        );
        assert_eq!(m.books_found, 2);
        assert_eq!(m.movies_found, 1);
        assert_eq!(m.products_found, 1);
        assert_eq!(m.unique_mentions, 5);
    }

    #[test]
    fn test_tv_shows_count_as_movies() {
        let mentions = vec![
            mention(RecommendationKind::Movie),
            mention(RecommendationKind::TvShow),
        ];
        let m = build_metric(
            Uuid::nil(),
            "baseline",
            None,
            Some(&run(1_000)),
            &mentions,
            "m",
            1.0,
            None,
        );
        assert_eq!(m.movies_found, 2);
        assert_eq!(m.books_found, 0);
    }

    #[test]
    fn test_cost_estimate() {
        // 400k chars ~= 100k tokens at 4 chars/token, at $3 per million.
        let cost = estimate_cost(400_000);
        assert!((cost - 0.3).abs() < 1e-9);
        assert_eq!(estimate_cost(0), 0.0);
    }

    #[test]
    fn test_error_recording() {
        let m = build_metric(
            Uuid::nil(),
            "baseline",
            None,
            None,
            &[],
            "m",
            0.5,
            Some("oracle unreachable"),
        );
        assert!(m.had_errors);
        assert_eq!(m.error_message.as_deref(), Some("oracle unreachable"));
        assert!(!m.coverage_verified);
    }

    #[test]
    fn test_phase_summary() {
        let mut a = build_metric(
            Uuid::nil(),
            "baseline",
            Some(&report(1_000)),
            Some(&run(1_000)),
            &[mention(RecommendationKind::Book)],
            "m",
            2.0,
            None,
        );
        a.unique_mentions = 4;
        let b = build_metric(
            Uuid::nil(),
            "baseline",
            None,
            None,
            &[],
            "m",
            4.0,
            Some("boom"),
        );
        let summary = summarize_phase("baseline", &[a, b]);
        assert_eq!(summary.episodes, 2);
        assert_eq!(summary.avg_processing_time_seconds, 3.0);
        assert_eq!(summary.complete_transcript_rate, 0.5);
        assert_eq!(summary.error_rate, 0.5);
        assert_eq!(summary.avg_unique_mentions, 2.0);
    }

    #[test]
    fn test_empty_phase_summary() {
        let summary = summarize_phase("empty", &[]);
        assert_eq!(summary.episodes, 0);
        assert_eq!(summary.error_rate, 0.0);
    }
}
