//! Polling worker that claims pending episodes and runs the pipeline.
//!
//! Single-concurrency by design: one episode is processed start to finish
//! before the next claim. When the queue is empty the worker sleeps for the
//! poll interval, waking early on shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use podshelf_core::{defaults, EpisodeRepository};

use crate::pipeline::{EpisodeProcessor, ProcessOutcome};

/// Worker behaviour knobs, read from the environment.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub enabled: bool,
    pub poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval: Duration::from_millis(defaults::WORKER_POLL_INTERVAL_MS),
        }
    }
}

impl WorkerConfig {
    /// Reads `PODSHELF_WORKER_ENABLED` and `PODSHELF_POLL_INTERVAL_MS`,
    /// falling back to defaults for unset or unparseable values.
    pub fn from_env() -> Self {
        let enabled = std::env::var("PODSHELF_WORKER_ENABLED")
            .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
            .unwrap_or(true);
        let poll_interval = std::env::var("PODSHELF_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(defaults::WORKER_POLL_INTERVAL_MS));
        Self {
            enabled,
            poll_interval,
        }
    }
}

/// Handle for stopping a running worker.
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: tokio::task::JoinHandle<()>,
}

impl WorkerHandle {
    /// Signals shutdown and waits for the in-flight episode to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(()).await;
        let _ = self.join.await;
    }
}

/// Claims pending episodes one at a time and hands them to the processor.
pub struct EpisodeWorker {
    episodes: Arc<dyn EpisodeRepository>,
    processor: Arc<EpisodeProcessor>,
    config: WorkerConfig,
}

impl EpisodeWorker {
    pub fn new(
        episodes: Arc<dyn EpisodeRepository>,
        processor: Arc<EpisodeProcessor>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            episodes,
            processor,
            config,
        }
    }

    /// Spawns the poll loop. Returns a handle the caller uses to stop it.
    pub fn start(self) -> WorkerHandle {
        let (tx, rx) = mpsc::channel(1);
        let join = tokio::spawn(self.run(rx));
        WorkerHandle { shutdown: tx, join }
    }

    async fn run(self, mut shutdown: mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!(subsystem = "worker", "worker disabled, not polling");
            return;
        }
        info!(
            subsystem = "worker",
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "worker started"
        );

        loop {
            match self.episodes.claim_next_pending().await {
                Ok(Some(episode)) => {
                    match self.processor.process(&episode).await {
                        Ok(ProcessOutcome::Completed { recommendations }) => {
                            info!(
                                subsystem = "worker",
                                episode_id = %episode.id,
                                recommendations,
                                "episode processed"
                            );
                        }
                        Ok(ProcessOutcome::Failed { reason }) => {
                            warn!(
                                subsystem = "worker",
                                episode_id = %episode.id,
                                reason = %reason,
                                "episode failed"
                            );
                        }
                        // Only store failures on the failed path escape the
                        // processor; the episode stays in processing.
                        Err(e) => {
                            error!(
                                subsystem = "worker",
                                episode_id = %episode.id,
                                error_msg = %e,
                                "processor error"
                            );
                        }
                    }
                    // Drain again immediately while work remains.
                    if shutdown.try_recv().is_ok() {
                        break;
                    }
                }
                Ok(None) => {
                    tokio::select! {
                        _ = shutdown.recv() => break,
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                    }
                }
                Err(e) => {
                    error!(subsystem = "worker", error_msg = %e, "claim failed");
                    tokio::select! {
                        _ = shutdown.recv() => break,
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                    }
                }
            }
        }
        info!(subsystem = "worker", "worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryStore, StaticTranscriptSource};
    use chrono::Utc;
    use podshelf_core::{
        Episode, EpisodeStatus, PipelineConfig, Transcript, TranscriptSegment,
    };
    use podshelf_enrich::{EnrichmentPipeline, MovieResolver};
    use podshelf_extract::MockOracle;
    use uuid::Uuid;

    fn pending_episode(title: &str) -> Episode {
        Episode {
            id: Uuid::now_v7(),
            title: title.to_string(),
            source_url: Some(format!("https://example.com/{title}")),
            duration_seconds: None,
            guest_names: vec![],
            transcript_source: None,
            processing_status: EpisodeStatus::Pending,
            processed_at: None,
            created_at: Utc::now(),
            transcript_metadata: None,
            processing_metadata: None,
        }
    }

    fn transcript() -> Transcript {
        Transcript::from_segments(
            (0..50)
                .map(|i| TranscriptSegment {
                    text: "Nothing of note was recommended in this stretch of audio."
                        .to_string(),
                    start: i as f64 * 5.0,
                    duration: 5.0,
                })
                .collect(),
        )
    }

    fn processor(store: &InMemoryStore) -> Arc<EpisodeProcessor> {
        let config = PipelineConfig::default();
        let enrichment = EnrichmentPipeline::new(&config)
            .unwrap()
            .without_cover_validation();
        let movies = MovieResolver::from_config(&config).unwrap();
        Arc::new(EpisodeProcessor::new(
            Arc::new(StaticTranscriptSource::new(transcript(), Some(600))),
            Arc::new(MockOracle::new()),
            store.episodes(),
            store.recommendations(),
            store.metrics(),
            enrichment,
            movies,
            config,
            "test",
        ))
    }

    #[tokio::test]
    async fn test_worker_drains_pending_queue() {
        let store = InMemoryStore::new();
        let a = pending_episode("First");
        let b = pending_episode("Second");
        store.seed_episode(a.clone());
        store.seed_episode(b.clone());

        let worker = EpisodeWorker::new(
            store.episodes(),
            processor(&store),
            WorkerConfig {
                enabled: true,
                poll_interval: Duration::from_millis(10),
            },
        );
        let handle = worker.start();

        for _ in 0..100 {
            let done = store.episode(a.id).processing_status == EpisodeStatus::Completed
                && store.episode(b.id).processing_status == EpisodeStatus::Completed;
            if done {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.shutdown().await;

        assert_eq!(store.episode(a.id).processing_status, EpisodeStatus::Completed);
        assert_eq!(store.episode(b.id).processing_status, EpisodeStatus::Completed);
        assert_eq!(store.metrics_rows().len(), 2);
    }

    #[tokio::test]
    async fn test_disabled_worker_leaves_queue_untouched() {
        let store = InMemoryStore::new();
        let ep = pending_episode("Idle");
        store.seed_episode(ep.clone());

        let worker = EpisodeWorker::new(
            store.episodes(),
            processor(&store),
            WorkerConfig {
                enabled: false,
                poll_interval: Duration::from_millis(10),
            },
        );
        let handle = worker.start();
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.shutdown().await;

        assert_eq!(store.episode(ep.id).processing_status, EpisodeStatus::Pending);
    }

    #[test]
    fn test_worker_config_defaults() {
        let config = WorkerConfig::default();
        assert!(config.enabled);
        assert_eq!(
            config.poll_interval,
            Duration::from_millis(defaults::WORKER_POLL_INTERVAL_MS)
        );
    }
}
