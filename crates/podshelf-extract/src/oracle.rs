//! HTTP extraction oracle backend (Anthropic messages API).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use podshelf_core::{Error, ExtractionOracle, PipelineConfig, Result};

/// Extraction oracle backed by an Anthropic-compatible messages endpoint.
pub struct AnthropicOracle {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicOracle {
    /// Build the oracle from pipeline configuration. Fails when no API key
    /// is configured.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let api_key = config
            .oracle_api_key
            .clone()
            .ok_or_else(|| Error::Config("PODSHELF_ORACLE_API_KEY is not set".into()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.oracle_timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))?;

        info!(
            model = %config.oracle_model,
            url = %config.oracle_url,
            timeout_secs = config.oracle_timeout_secs,
            "initializing extraction oracle"
        );

        Ok(Self {
            client,
            base_url: config.oracle_url.clone(),
            api_key,
            model: config.oracle_model.clone(),
            max_tokens: config.oracle_max_tokens,
        })
    }

    /// Override the base URL (test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl ExtractionOracle for AnthropicOracle {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let start = Instant::now();
        debug!(prompt_len = prompt.len(), model = %self.model, "oracle call");

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Extraction(format!(
                "oracle returned {status}: {body}"
            )));
        }

        let parsed: MessagesResponse = response.json().await?;
        let text = parsed
            .content
            .first()
            .map(|b| b.text.clone())
            .unwrap_or_default();

        debug!(
            response_len = text.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "oracle call complete"
        );
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
