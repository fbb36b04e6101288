//! Worker binary: polls the episode queue and processes each episode
//! through extraction, enrichment, and persistence.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use podshelf_core::PipelineConfig;
use podshelf_db::{
    create_pool, ensure_schema, PgEpisodeRepository, PgMetricsRepository,
    PgRecommendationRepository,
};
use podshelf_enrich::{EnrichmentPipeline, MovieResolver};
use podshelf_extract::AnthropicOracle;
use podshelf_jobs::{EpisodeProcessor, EpisodeWorker, HttpTranscriptSource, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = PipelineConfig::from_env().context("loading pipeline config")?;
    let worker_config = WorkerConfig::from_env();
    let phase = std::env::var("PODSHELF_PHASE").unwrap_or_else(|_| "phase_1".to_string());

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;
    let transcript_api_url = std::env::var("PODSHELF_TRANSCRIPT_API_URL")
        .context("PODSHELF_TRANSCRIPT_API_URL is required")?;

    let pool = create_pool(&database_url).await?;
    ensure_schema(&pool).await?;

    let episodes = Arc::new(PgEpisodeRepository::new(pool.clone()));
    let recommendations = Arc::new(PgRecommendationRepository::new(pool.clone()));
    let metrics = Arc::new(PgMetricsRepository::new(pool.clone()));

    let transcripts = Arc::new(HttpTranscriptSource::new(transcript_api_url)?);
    let oracle = Arc::new(AnthropicOracle::from_config(&config)?);
    let enrichment = EnrichmentPipeline::new(&config)?;
    let movies = MovieResolver::from_config(&config)?;

    let processor = Arc::new(EpisodeProcessor::new(
        transcripts,
        oracle,
        episodes.clone(),
        recommendations,
        metrics,
        enrichment,
        movies,
        config,
        phase,
    ));

    let handle = EpisodeWorker::new(episodes, processor, worker_config).start();

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    handle.shutdown().await;
    Ok(())
}
