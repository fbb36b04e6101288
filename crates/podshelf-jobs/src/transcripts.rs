//! HTTP transcript source.
//!
//! Fetches caption segments from a companion transcript service keyed by
//! episode ID. The service's status codes map onto the transcript error
//! taxonomy: 404 means no transcript exists, 403 means the source has
//! captions disabled, anything else non-2xx is a transport failure.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use podshelf_core::{
    Episode, Error, Result, Transcript, TranscriptSegment, TranscriptSource,
};

const FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct TranscriptPayload {
    segments: Vec<SegmentPayload>,
    #[serde(default)]
    duration_seconds: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SegmentPayload {
    text: String,
    start: f64,
    duration: f64,
}

/// Transcript source backed by an HTTP transcript service.
pub struct HttpTranscriptSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTranscriptSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TranscriptSource for HttpTranscriptSource {
    async fn fetch(&self, episode: &Episode) -> Result<(Transcript, Option<u32>)> {
        let url = format!("{}/episodes/{}/transcript", self.base_url, episode.id);
        debug!(
            subsystem = "transcripts",
            episode_id = %episode.id,
            "fetching transcript"
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::TranscriptUnavailable(e.to_string()))?;

        match response.status().as_u16() {
            404 => {
                return Err(Error::TranscriptUnavailable(format!(
                    "no transcript for episode {}",
                    episode.id
                )))
            }
            403 => {
                return Err(Error::TranscriptsDisabled(format!(
                    "captions disabled for episode {}",
                    episode.id
                )))
            }
            s if !(200..300).contains(&s) => {
                return Err(Error::Request(format!(
                    "transcript service returned status {s}"
                )))
            }
            _ => {}
        }

        let payload: TranscriptPayload = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let segments = payload
            .segments
            .into_iter()
            .map(|s| TranscriptSegment {
                text: s.text,
                start: s.start,
                duration: s.duration,
            })
            .collect();

        Ok((Transcript::from_segments(segments), payload.duration_seconds))
    }
}
