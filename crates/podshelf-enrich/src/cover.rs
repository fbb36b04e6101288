//! Cover image validation and fallback resolution.
//!
//! Commerce and open-catalog providers serve tiny placeholder images for
//! unknown ISBNs instead of a 404, so every candidate cover URL is probed
//! with a HEAD request and gated on status, content type, and byte size
//! before it is persisted as authoritative. Absence of a cover is a valid
//! outcome; a URL is never fabricated.

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use podshelf_core::{defaults, CanonicalCatalogEntry, Error, PipelineConfig, Result};

use crate::catalog::{amazon_cover_url, open_library_cover_url};

const ACCEPTED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// Why a candidate cover URL was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverRejection {
    RequestFailed(String),
    HttpStatus(u16),
    /// The commerce provider answers unknown ISBNs with a GIF placeholder.
    PlaceholderGif,
    UnsupportedContentType(String),
    /// Known exact placeholder byte size.
    PlaceholderSize(u64),
    TooSmall(u64),
    TooSmallDimensions(u32, u32),
}

/// Outcome of probing one candidate cover URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverValidation {
    pub valid: bool,
    pub rejection: Option<CoverRejection>,
    pub size_bytes: Option<u64>,
}

impl CoverValidation {
    fn ok(size_bytes: Option<u64>) -> Self {
        Self {
            valid: true,
            rejection: None,
            size_bytes,
        }
    }

    fn reject(rejection: CoverRejection, size_bytes: Option<u64>) -> Self {
        Self {
            valid: false,
            rejection: Some(rejection),
            size_bytes,
        }
    }
}

/// Validates candidate cover URLs and walks the provider fallback chain.
pub struct CoverImageResolver {
    client: Client,
    min_bytes: u64,
    min_dimension: u32,
}

impl CoverImageResolver {
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(defaults::COVER_HEAD_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            min_bytes: config.cover_min_bytes,
            min_dimension: config.cover_min_dimension,
        })
    }

    /// Probe a candidate URL with a HEAD request. Transport failures count
    /// as invalid, not as errors, so the fallback chain keeps walking.
    pub async fn validate(&self, url: &str) -> CoverValidation {
        let response = match self.client.head(url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(%url, error = %e, "cover probe failed");
                return CoverValidation::reject(CoverRejection::RequestFailed(e.to_string()), None);
            }
        };

        let status = response.status();
        if !status.is_success() {
            return CoverValidation::reject(CoverRejection::HttpStatus(status.as_u16()), None);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_lowercase())
            .unwrap_or_default();
        let size = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        if content_type == "image/gif" && url.contains("amazon") {
            return CoverValidation::reject(CoverRejection::PlaceholderGif, size);
        }
        if !ACCEPTED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return CoverValidation::reject(
                CoverRejection::UnsupportedContentType(content_type),
                size,
            );
        }
        if let Some(bytes) = size {
            if bytes == defaults::COVER_PLACEHOLDER_BYTES {
                return CoverValidation::reject(CoverRejection::PlaceholderSize(bytes), size);
            }
            if bytes < self.min_bytes {
                return CoverValidation::reject(CoverRejection::TooSmall(bytes), size);
            }
        }

        CoverValidation::ok(size)
    }

    /// Full validation: fetch the image and reject covers whose decoded
    /// dimensions fall below the minimum.
    pub async fn validate_full(&self, url: &str) -> CoverValidation {
        let head = self.validate(url).await;
        if !head.valid {
            return head;
        }

        let bytes = match self.client.get(url).send().await {
            Ok(r) => match r.bytes().await {
                Ok(b) => b,
                Err(e) => {
                    return CoverValidation::reject(
                        CoverRejection::RequestFailed(e.to_string()),
                        head.size_bytes,
                    )
                }
            },
            Err(e) => {
                return CoverValidation::reject(
                    CoverRejection::RequestFailed(e.to_string()),
                    head.size_bytes,
                )
            }
        };

        match image::load_from_memory(&bytes) {
            Ok(img) => {
                let (w, h) = (img.width(), img.height());
                if w < self.min_dimension || h < self.min_dimension {
                    CoverValidation::reject(
                        CoverRejection::TooSmallDimensions(w, h),
                        Some(bytes.len() as u64),
                    )
                } else {
                    CoverValidation::ok(Some(bytes.len() as u64))
                }
            }
            Err(e) => CoverValidation::reject(
                CoverRejection::RequestFailed(format!("image decode failed: {e}")),
                Some(bytes.len() as u64),
            ),
        }
    }

    /// Walk candidate URLs in order; first valid cover wins. `None` when
    /// every candidate fails.
    pub async fn resolve(&self, candidates: &[String]) -> Option<String> {
        for url in candidates {
            let validation = self.validate(url).await;
            if validation.valid {
                info!(%url, size_bytes = ?validation.size_bytes, "cover accepted");
                return Some(url.clone());
            }
            debug!(%url, rejection = ?validation.rejection, "cover rejected");
        }
        None
    }
}

/// Candidate cover URLs for a catalog entry, in provider preference order.
pub fn candidate_urls(entry: &CanonicalCatalogEntry) -> Vec<String> {
    let mut candidates = Vec::new();
    if let Some(isbn10) = &entry.isbn_10 {
        candidates.push(amazon_cover_url(isbn10));
    }
    if let Some(isbn13) = &entry.isbn_13 {
        candidates.push(open_library_cover_url(isbn13));
    }
    if let Some(isbn10) = &entry.isbn_10 {
        candidates.push(open_library_cover_url(isbn10));
    }
    if let Some(url) = &entry.image_url {
        if !candidates.contains(url) {
            candidates.push(url.clone());
        }
    }
    if let Some(url) = &entry.thumbnail_url {
        if !candidates.contains(url) {
            candidates.push(url.clone());
        }
    }
    candidates
}
