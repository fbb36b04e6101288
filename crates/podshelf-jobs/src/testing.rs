//! In-memory test doubles for the pipeline's repository and source seams.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use podshelf_core::{
    EnrichedRecommendation, Episode, EpisodeRepository, EpisodeStatus, Error, MetricsRepository,
    ProcessingMetric, RecommendationRepository, Result, Transcript, TranscriptSource,
};

#[derive(Default)]
struct StoreState {
    episodes: Vec<Episode>,
    recommendations: Vec<EnrichedRecommendation>,
    metrics: Vec<ProcessingMetric>,
}

/// Shared in-memory store backing the repository traits.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_episode(&self, episode: Episode) {
        self.state.lock().unwrap().episodes.push(episode);
    }

    pub fn episode(&self, id: Uuid) -> Episode {
        self.state
            .lock()
            .unwrap()
            .episodes
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .expect("episode seeded")
    }

    pub fn recommendations_for(&self, episode_id: Uuid) -> Vec<EnrichedRecommendation> {
        self.state
            .lock()
            .unwrap()
            .recommendations
            .iter()
            .filter(|r| r.episode_id == episode_id)
            .cloned()
            .collect()
    }

    pub fn metrics_rows(&self) -> Vec<ProcessingMetric> {
        self.state.lock().unwrap().metrics.clone()
    }

    pub fn episodes(&self) -> Arc<dyn EpisodeRepository> {
        Arc::new(InMemoryEpisodes {
            state: self.state.clone(),
        })
    }

    pub fn recommendations(&self) -> Arc<dyn RecommendationRepository> {
        Arc::new(InMemoryRecommendations {
            state: self.state.clone(),
        })
    }

    pub fn metrics(&self) -> Arc<dyn MetricsRepository> {
        Arc::new(InMemoryMetrics {
            state: self.state.clone(),
        })
    }
}

struct InMemoryEpisodes {
    state: Arc<Mutex<StoreState>>,
}

#[async_trait]
impl EpisodeRepository for InMemoryEpisodes {
    async fn insert_if_absent(&self, episode: &Episode) -> Result<Option<Uuid>> {
        let mut state = self.state.lock().unwrap();
        let exists = episode.source_url.is_some()
            && state
                .episodes
                .iter()
                .any(|e| e.source_url == episode.source_url);
        if exists {
            return Ok(None);
        }
        state.episodes.push(episode.clone());
        Ok(Some(episode.id))
    }

    async fn fetch(&self, id: Uuid) -> Result<Episode> {
        self.state
            .lock()
            .unwrap()
            .episodes
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(Error::EpisodeNotFound(id))
    }

    async fn claim_next_pending(&self) -> Result<Option<Episode>> {
        let mut state = self.state.lock().unwrap();
        let next = state
            .episodes
            .iter_mut()
            .filter(|e| e.processing_status == EpisodeStatus::Pending)
            .min_by_key(|e| e.created_at);
        Ok(next.map(|e| {
            e.processing_status = EpisodeStatus::Processing;
            e.clone()
        }))
    }

    async fn update_status(&self, id: Uuid, status: EpisodeStatus) -> Result<()> {
        self.with_episode(id, |e| e.processing_status = status)
    }

    async fn store_transcript_metadata(&self, id: Uuid, metadata: &JsonValue) -> Result<()> {
        let metadata = metadata.clone();
        self.with_episode(id, move |e| e.transcript_metadata = Some(metadata.clone()))
    }

    async fn store_processing_metadata(&self, id: Uuid, metadata: &JsonValue) -> Result<()> {
        let metadata = metadata.clone();
        self.with_episode(id, move |e| e.processing_metadata = Some(metadata.clone()))
    }

    async fn mark_completed(&self, id: Uuid) -> Result<()> {
        self.with_episode(id, |e| {
            e.processing_status = EpisodeStatus::Completed;
            e.processed_at = Some(Utc::now());
        })
    }

    async fn list_by_status(&self, status: EpisodeStatus, limit: i64) -> Result<Vec<Episode>> {
        let state = self.state.lock().unwrap();
        let mut out: Vec<Episode> = state
            .episodes
            .iter()
            .filter(|e| e.processing_status == status)
            .cloned()
            .collect();
        out.sort_by_key(|e| e.created_at);
        out.truncate(limit as usize);
        Ok(out)
    }
}

impl InMemoryEpisodes {
    fn with_episode(&self, id: Uuid, f: impl FnOnce(&mut Episode)) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let episode = state
            .episodes
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(Error::EpisodeNotFound(id))?;
        f(episode);
        Ok(())
    }
}

struct InMemoryRecommendations {
    state: Arc<Mutex<StoreState>>,
}

#[async_trait]
impl RecommendationRepository for InMemoryRecommendations {
    async fn insert(&self, rec: &EnrichedRecommendation) -> Result<Uuid> {
        self.state.lock().unwrap().recommendations.push(rec.clone());
        Ok(rec.id)
    }

    async fn list_for_episode(&self, episode_id: Uuid) -> Result<Vec<EnrichedRecommendation>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .recommendations
            .iter()
            .filter(|r| r.episode_id == episode_id)
            .cloned()
            .collect())
    }

    async fn list_books(&self) -> Result<Vec<EnrichedRecommendation>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .recommendations
            .iter()
            .filter(|r| r.details.as_book().is_some())
            .cloned()
            .collect())
    }

    async fn delete_for_episode(&self, episode_id: Uuid) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        let before = state.recommendations.len();
        state.recommendations.retain(|r| r.episode_id != episode_id);
        Ok((before - state.recommendations.len()) as u64)
    }
}

struct InMemoryMetrics {
    state: Arc<Mutex<StoreState>>,
}

#[async_trait]
impl MetricsRepository for InMemoryMetrics {
    async fn insert(&self, metric: &ProcessingMetric) -> Result<Uuid> {
        self.state.lock().unwrap().metrics.push(metric.clone());
        Ok(metric.id)
    }

    async fn list_for_episode(&self, episode_id: Uuid) -> Result<Vec<ProcessingMetric>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .metrics
            .iter()
            .filter(|m| m.episode_id == episode_id)
            .cloned()
            .collect())
    }

    async fn list_for_phase(&self, phase: &str) -> Result<Vec<ProcessingMetric>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .metrics
            .iter()
            .filter(|m| m.phase == phase)
            .cloned()
            .collect())
    }
}

/// Transcript source returning a fixed transcript, or a fixed failure.
pub struct StaticTranscriptSource {
    transcript: Option<Transcript>,
    duration: Option<u32>,
    failure: Option<String>,
}

impl StaticTranscriptSource {
    pub fn new(transcript: Transcript, duration: Option<u32>) -> Self {
        Self {
            transcript: Some(transcript),
            duration,
            failure: None,
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            transcript: None,
            duration: None,
            failure: Some(message.into()),
        }
    }
}

#[async_trait]
impl TranscriptSource for StaticTranscriptSource {
    async fn fetch(&self, _episode: &Episode) -> Result<(Transcript, Option<u32>)> {
        if let Some(message) = &self.failure {
            return Err(Error::TranscriptsDisabled(message.clone()));
        }
        Ok((
            self.transcript.as_ref().cloned().expect("transcript set"),
            self.duration,
        ))
    }
}
