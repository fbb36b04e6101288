//! Bibliographic catalog lookups (Google Books volumes API).
//!
//! Search requests ask for the top candidates but only the first result is
//! used; there is no re-ranking across candidates. The resolver normalizes
//! the provider's volume shape into a [`CanonicalCatalogEntry`], including
//! ISBN extraction by declared identifier type and the cover-image URL
//! fallback order.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use podshelf_core::{defaults, CanonicalCatalogEntry, Error, PipelineConfig, Result};

use crate::isbn::{extract_year, isbn13_to_isbn10};

/// Resolves extracted titles against the external bibliographic catalog.
pub struct CatalogResolver {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CatalogResolver {
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.catalog_url.clone(),
            api_key: config.catalog_api_key.clone(),
        })
    }

    /// Override the base URL (test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Search the catalog by title, narrowed by author when one is known.
    /// Returns the first candidate or `None` when the catalog has no match.
    pub async fn lookup_by_title_author(
        &self,
        title: &str,
        author: Option<&str>,
    ) -> Result<Option<CanonicalCatalogEntry>> {
        let mut query = format!("intitle:{title}");
        if let Some(author) = author {
            query.push_str(&format!("+inauthor:{author}"));
        }
        debug!(%query, "catalog search");
        self.search(&query).await
    }

    /// Look up a single volume by ISBN (10 or 13).
    pub async fn lookup_by_isbn(&self, isbn: &str) -> Result<Option<CanonicalCatalogEntry>> {
        self.search(&format!("isbn:{isbn}")).await
    }

    async fn search(&self, query: &str) -> Result<Option<CanonicalCatalogEntry>> {
        let mut params = vec![
            ("q".to_string(), query.to_string()),
            (
                "maxResults".to_string(),
                defaults::CATALOG_MAX_RESULTS.to_string(),
            ),
        ];
        if let Some(key) = &self.api_key {
            params.push(("key".to_string(), key.clone()));
        }

        let response = self.client.get(&self.base_url).query(&params).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, %query, "catalog request failed");
            return Err(Error::Enrichment(format!("catalog returned {status}")));
        }

        let body: VolumesResponse = response.json().await?;
        let Some(volume) = body.items.into_iter().next() else {
            info!(%query, "no catalog match");
            return Ok(None);
        };

        Ok(Some(entry_from_volume(volume)))
    }
}

#[derive(Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Deserialize)]
struct Volume {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "volumeInfo", default)]
    volume_info: VolumeInfo,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    subtitle: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    publisher: Option<String>,
    published_date: Option<String>,
    description: Option<String>,
    #[serde(default)]
    industry_identifiers: Vec<IndustryIdentifier>,
    page_count: Option<i32>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    image_links: ImageLinks,
    info_link: Option<String>,
    canonical_volume_link: Option<String>,
}

#[derive(Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    small_thumbnail: Option<String>,
    thumbnail: Option<String>,
    medium: Option<String>,
    large: Option<String>,
}

fn entry_from_volume(volume: Volume) -> CanonicalCatalogEntry {
    let info = volume.volume_info;

    // ISBN by declared identifier type, never by length alone.
    let mut isbn_10 = None;
    let mut isbn_13 = None;
    for ident in &info.industry_identifiers {
        match ident.kind.as_str() {
            "ISBN_10" => isbn_10 = Some(ident.identifier.clone()),
            "ISBN_13" => isbn_13 = Some(ident.identifier.clone()),
            _ => {}
        }
    }
    if isbn_10.is_none() {
        if let Some(isbn13) = &isbn_13 {
            isbn_10 = isbn13_to_isbn10(isbn13);
        }
    }

    let image_url = resolve_image_url(isbn_10.as_deref(), isbn_13.as_deref(), &info.image_links);
    let amazon_url = amazon_search_url(info.title.as_deref(), info.authors.first());

    CanonicalCatalogEntry {
        catalog_id: volume.id,
        title: info.title,
        subtitle: info.subtitle,
        authors: info.authors,
        isbn_10,
        isbn_13,
        publisher: info.publisher,
        published_year: info.published_date.as_deref().and_then(extract_year),
        page_count: info.page_count,
        description: info.description,
        categories: info.categories,
        image_url,
        thumbnail_url: info.image_links.thumbnail.clone().map(upgrade_https),
        info_url: info.canonical_volume_link.or(info.info_link),
        amazon_url,
    }
}

/// Cover image URL in provider preference order. First candidate wins; the
/// result is unvalidated here, validation is the cover resolver's job.
fn resolve_image_url(
    isbn_10: Option<&str>,
    isbn_13: Option<&str>,
    links: &ImageLinks,
) -> Option<String> {
    if let Some(isbn10) = isbn_10 {
        return Some(amazon_cover_url(isbn10));
    }
    if let Some(isbn13) = isbn_13 {
        return Some(open_library_cover_url(isbn13));
    }
    [
        links.large.as_ref(),
        links.medium.as_ref(),
        links.thumbnail.as_ref(),
        links.small_thumbnail.as_ref(),
    ]
    .into_iter()
    .flatten()
    .next()
    .cloned()
    .map(upgrade_https)
}

/// Commerce cover image keyed on ISBN-10. Known to serve a tiny GIF
/// placeholder for unknown ISBNs, which validation rejects downstream.
pub fn amazon_cover_url(isbn10: &str) -> String {
    format!("https://images-na.ssl-images-amazon.com/images/P/{isbn10}.01.LZZZZZZZ.jpg")
}

/// Open-catalog cover keyed on any ISBN. No API key required.
pub fn open_library_cover_url(isbn: &str) -> String {
    format!("https://covers.openlibrary.org/b/isbn/{isbn}-L.jpg")
}

/// Heuristic commerce search link, always derivable from title + author.
pub fn amazon_search_url(title: Option<&str>, author: Option<&String>) -> Option<String> {
    let title = title?;
    let query = match author {
        Some(author) => format!("{title} {author}"),
        None => title.to_string(),
    };
    Some(format!(
        "https://www.amazon.com/s?k={}",
        urlencoding::encode(&query)
    ))
}

fn upgrade_https(url: String) -> String {
    if let Some(rest) = url.strip_prefix("http://") {
        format!("https://{rest}")
    } else {
        url
    }
}
