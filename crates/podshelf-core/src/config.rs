//! Pipeline configuration.
//!
//! One [`PipelineConfig`] is constructed at process start (usually via
//! [`PipelineConfig::from_env`]) and passed by reference into each component
//! constructor. There is no ambient global settings object.

use crate::defaults;
use crate::error::{Error, Result};

/// Explicit configuration for the extraction and enrichment pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    // Oracle
    pub oracle_api_key: Option<String>,
    pub oracle_url: String,
    pub oracle_model: String,
    pub oracle_max_tokens: u32,
    pub oracle_timeout_secs: u64,

    // Enrichment providers
    pub catalog_url: String,
    pub catalog_api_key: Option<String>,
    pub movie_api_url: String,
    pub movie_api_key: Option<String>,
    pub http_timeout_secs: u64,

    // Dispatch
    pub single_pass_threshold: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,

    // Match acceptance (empirically tuned; kept configurable, not hardcoded)
    pub title_match_threshold: u8,
    pub author_match_threshold: u8,

    // Cover validation policy
    pub cover_min_bytes: u64,
    pub cover_min_dimension: u32,

    /// Name attributed to host recommendations when the oracle identifies
    /// the host as the recommender.
    pub host_name: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            oracle_api_key: None,
            oracle_url: defaults::ORACLE_URL.to_string(),
            oracle_model: defaults::ORACLE_MODEL.to_string(),
            oracle_max_tokens: defaults::ORACLE_MAX_TOKENS,
            oracle_timeout_secs: defaults::ORACLE_TIMEOUT_SECS,
            catalog_url: defaults::CATALOG_URL.to_string(),
            catalog_api_key: None,
            movie_api_url: defaults::MOVIE_API_URL.to_string(),
            movie_api_key: None,
            http_timeout_secs: defaults::HTTP_TIMEOUT_SECS,
            single_pass_threshold: defaults::SINGLE_PASS_THRESHOLD,
            chunk_size: defaults::CHUNK_SIZE,
            chunk_overlap: defaults::CHUNK_OVERLAP,
            title_match_threshold: defaults::TITLE_MATCH_THRESHOLD,
            author_match_threshold: defaults::AUTHOR_MATCH_THRESHOLD,
            cover_min_bytes: defaults::COVER_MIN_BYTES,
            cover_min_dimension: defaults::COVER_MIN_DIMENSION,
            host_name: None,
        }
    }
}

impl PipelineConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `PODSHELF_ORACLE_API_KEY` | unset |
    /// | `PODSHELF_ORACLE_URL` | Anthropic API |
    /// | `PODSHELF_ORACLE_MODEL` | `claude-sonnet-4-20250514` |
    /// | `PODSHELF_ORACLE_TIMEOUT_SECS` | 120 |
    /// | `PODSHELF_CATALOG_API_KEY` | unset |
    /// | `PODSHELF_MOVIE_API_KEY` | unset |
    /// | `PODSHELF_CHUNK_SIZE` | 100000 |
    /// | `PODSHELF_CHUNK_OVERLAP` | 2000 |
    /// | `PODSHELF_TITLE_MATCH_THRESHOLD` | 70 |
    /// | `PODSHELF_AUTHOR_MATCH_THRESHOLD` | 60 |
    /// | `PODSHELF_HOST_NAME` | unset |
    pub fn from_env() -> Result<Self> {
        let mut config = Self {
            oracle_api_key: env_opt("PODSHELF_ORACLE_API_KEY"),
            catalog_api_key: env_opt("PODSHELF_CATALOG_API_KEY"),
            movie_api_key: env_opt("PODSHELF_MOVIE_API_KEY"),
            host_name: env_opt("PODSHELF_HOST_NAME"),
            ..Self::default()
        };

        if let Some(url) = env_opt("PODSHELF_ORACLE_URL") {
            config.oracle_url = url;
        }
        if let Some(model) = env_opt("PODSHELF_ORACLE_MODEL") {
            config.oracle_model = model;
        }
        if let Some(url) = env_opt("PODSHELF_CATALOG_URL") {
            config.catalog_url = url;
        }
        if let Some(url) = env_opt("PODSHELF_MOVIE_API_URL") {
            config.movie_api_url = url;
        }
        if let Some(v) = env_parse("PODSHELF_ORACLE_TIMEOUT_SECS") {
            config.oracle_timeout_secs = v;
        }
        if let Some(v) = env_parse("PODSHELF_HTTP_TIMEOUT_SECS") {
            config.http_timeout_secs = v;
        }
        if let Some(v) = env_parse("PODSHELF_SINGLE_PASS_THRESHOLD") {
            config.single_pass_threshold = v;
        }
        if let Some(v) = env_parse("PODSHELF_CHUNK_SIZE") {
            config.chunk_size = v;
        }
        if let Some(v) = env_parse("PODSHELF_CHUNK_OVERLAP") {
            config.chunk_overlap = v;
        }
        if let Some(v) = env_parse("PODSHELF_TITLE_MATCH_THRESHOLD") {
            config.title_match_threshold = v;
        }
        if let Some(v) = env_parse("PODSHELF_AUTHOR_MATCH_THRESHOLD") {
            config.author_match_threshold = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Fail fast on contract violations instead of tolerating them at use
    /// sites.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.title_match_threshold > 100 || self.author_match_threshold > 100 {
            return Err(Error::Config(
                "match thresholds are percentages in 0-100".into(),
            ));
        }
        Ok(())
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_thresholds() {
        let config = PipelineConfig::default();
        assert_eq!(config.title_match_threshold, 70);
        assert_eq!(config.author_match_threshold, 60);
        assert_eq!(config.single_pass_threshold, 100_000);
        assert_eq!(config.chunk_size, 100_000);
        assert_eq!(config.chunk_overlap, 2_000);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let config = PipelineConfig {
            chunk_overlap: 100_000,
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let config = PipelineConfig {
            chunk_size: 0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
