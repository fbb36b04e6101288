//! Movie and TV enrichment against the TMDB search API.
//!
//! Optional: without an API key every lookup resolves to `None` and the
//! mention is persisted unenriched.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use podshelf_core::{Error, MovieDetails, PipelineConfig, Result};

const POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";
const BACKDROP_BASE: &str = "https://image.tmdb.org/t/p/w1280";

/// Resolves movie/TV titles against the external movie database.
pub struct MovieResolver {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl MovieResolver {
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.movie_api_url.clone(),
            api_key: config.movie_api_key.clone(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Search by title; first result wins. `None` when unconfigured or no
    /// match.
    pub async fn lookup(&self, title: &str) -> Result<Option<MovieDetails>> {
        let Some(api_key) = &self.api_key else {
            debug!("movie enrichment skipped, no API key configured");
            return Ok(None);
        };

        let response = self
            .client
            .get(format!("{}/search/movie", self.base_url))
            .query(&[("api_key", api_key.as_str()), ("query", title)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::Enrichment(format!(
                "movie API returned {}",
                response.status()
            )));
        }

        let body: SearchResponse = response.json().await?;
        let Some(hit) = body.results.into_iter().next() else {
            info!(%title, "no movie match");
            return Ok(None);
        };

        Ok(Some(MovieDetails {
            tmdb_id: Some(hit.id),
            description: hit.overview,
            release_year: hit
                .release_date
                .as_deref()
                .and_then(crate::isbn::extract_year),
            rating: hit.vote_average,
            poster_url: hit.poster_path.map(|p| format!("{POSTER_BASE}{p}")),
            backdrop_url: hit.backdrop_path.map(|p| format!("{BACKDROP_BASE}{p}")),
        }))
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    id: i64,
    overview: Option<String>,
    release_date: Option<String>,
    vote_average: Option<f64>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver(uri: &str, key: Option<&str>) -> MovieResolver {
        let config = PipelineConfig {
            movie_api_key: key.map(String::from),
            ..PipelineConfig::default()
        };
        MovieResolver::from_config(&config)
            .unwrap()
            .with_base_url(uri.to_string())
    }

    #[tokio::test]
    async fn test_no_api_key_is_none_without_network() {
        let out = resolver("http://127.0.0.1:1", None)
            .lookup("Arrival")
            .await
            .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn test_first_result_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .and(query_param("query", "Arrival"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{
                    "id": 329865,
                    "overview": "A linguist is recruited by the military.",
                    "release_date": "2016-11-10",
                    "vote_average": 7.6,
                    "poster_path": "/poster.jpg",
                    "backdrop_path": "/backdrop.jpg"
                }]
            })))
            .mount(&server)
            .await;

        let details = resolver(&server.uri(), Some("k"))
            .lookup("Arrival")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(details.tmdb_id, Some(329865));
        assert_eq!(details.release_year, Some(2016));
        assert_eq!(
            details.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/poster.jpg")
        );
    }

    #[tokio::test]
    async fn test_empty_results_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})),
            )
            .mount(&server)
            .await;

        let out = resolver(&server.uri(), Some("k"))
            .lookup("Nothing")
            .await
            .unwrap();
        assert!(out.is_none());
    }
}
