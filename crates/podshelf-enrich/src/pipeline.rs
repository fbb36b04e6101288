//! Book enrichment: catalog match scoring and enriched-record assembly.
//!
//! Rejections are expected, frequent terminal states, not errors. Every
//! rejection carries its reason and is logged with the mention title so a
//! run can be diagnosed offline without re-running. Only transport and
//! parsing failures surface as errors.

use tracing::{debug, info};

use podshelf_core::{
    is_placeholder, normalize_placeholder, BookDetails, CanonicalCatalogEntry, ExtractedMention,
    PipelineConfig, Result,
};

use crate::catalog::CatalogResolver;
use crate::cover::{candidate_urls, CoverImageResolver};
use crate::scorer;

/// Why a mention was not enriched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Title empty or a recognized placeholder; rejected before any network
    /// call.
    MissingTitle,
    NotFound,
    LowTitleScore(u8),
    LowAuthorScore(u8),
    MissingRequiredField(&'static str),
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::MissingTitle => "missing_title",
            RejectReason::NotFound => "not_found",
            RejectReason::LowTitleScore(_) => "low_title_score",
            RejectReason::LowAuthorScore(_) => "low_author_score",
            RejectReason::MissingRequiredField(_) => "missing_required_field",
        }
    }
}

/// Terminal outcome of one enrichment attempt.
#[derive(Debug)]
pub enum EnrichmentOutcome {
    Enriched(Box<BookDetails>),
    Rejected(RejectReason),
}

impl EnrichmentOutcome {
    pub fn is_enriched(&self) -> bool {
        matches!(self, EnrichmentOutcome::Enriched(_))
    }
}

/// Enriches extracted book mentions against the bibliographic catalog.
pub struct EnrichmentPipeline {
    catalog: CatalogResolver,
    /// When present, candidate covers are probed before persistence. Absent
    /// in offline contexts; the catalog's unvalidated URL is kept as-is.
    cover: Option<CoverImageResolver>,
    title_threshold: u8,
    author_threshold: u8,
}

impl EnrichmentPipeline {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            catalog: CatalogResolver::from_config(config)?,
            cover: Some(CoverImageResolver::from_config(config)?),
            title_threshold: config.title_match_threshold,
            author_threshold: config.author_match_threshold,
        })
    }

    pub fn with_catalog(mut self, catalog: CatalogResolver) -> Self {
        self.catalog = catalog;
        self
    }

    /// Disable cover probing (offline/test contexts).
    pub fn without_cover_validation(mut self) -> Self {
        self.cover = None;
        self
    }

    /// Enrich one book mention. `Rejected` outcomes are terminal and
    /// expected; `Err` means a provider transport or parse failure.
    pub async fn enrich_book(&self, mention: &ExtractedMention) -> Result<EnrichmentOutcome> {
        let title = mention.title.trim();
        if title.is_empty() || is_placeholder(title) {
            debug!(title = %mention.title, "rejected: placeholder title");
            return Ok(EnrichmentOutcome::Rejected(RejectReason::MissingTitle));
        }

        let author = normalize_placeholder(mention.author_creator.as_deref());

        let Some(entry) = self
            .catalog
            .lookup_by_title_author(title, author.as_deref())
            .await?
        else {
            info!(%title, "rejected: no catalog match");
            return Ok(EnrichmentOutcome::Rejected(RejectReason::NotFound));
        };

        let catalog_title = entry.title.as_deref().unwrap_or_default();
        let title_score = scorer::ratio(title, catalog_title);
        if title_score < self.title_threshold {
            info!(%title, %catalog_title, score = title_score, "rejected: low title score");
            return Ok(EnrichmentOutcome::Rejected(RejectReason::LowTitleScore(
                title_score,
            )));
        }

        if let Some(author) = &author {
            let catalog_authors = entry.author_display().unwrap_or_default();
            let author_score = scorer::partial_ratio(author, &catalog_authors);
            if author_score < self.author_threshold {
                info!(
                    %title,
                    %author,
                    %catalog_authors,
                    score = author_score,
                    "rejected: low author score"
                );
                return Ok(EnrichmentOutcome::Rejected(RejectReason::LowAuthorScore(
                    author_score,
                )));
            }
        }

        if entry.title.as_deref().map_or(true, |t| t.is_empty()) {
            return Ok(EnrichmentOutcome::Rejected(
                RejectReason::MissingRequiredField("title"),
            ));
        }
        if entry.authors.is_empty() {
            info!(%title, "rejected: catalog entry has no authors");
            return Ok(EnrichmentOutcome::Rejected(
                RejectReason::MissingRequiredField("author"),
            ));
        }
        if entry.isbn_13.is_none() && entry.isbn_10.is_none() {
            info!(%title, "rejected: catalog entry has no ISBN");
            return Ok(EnrichmentOutcome::Rejected(
                RejectReason::MissingRequiredField("isbn"),
            ));
        }

        let details = self.build_details(&entry, title_score).await;
        Ok(EnrichmentOutcome::Enriched(Box::new(details)))
    }

    async fn build_details(&self, entry: &CanonicalCatalogEntry, title_score: u8) -> BookDetails {
        let cover_image_url = match &self.cover {
            Some(resolver) => resolver.resolve(&candidate_urls(entry)).await,
            None => entry.image_url.clone(),
        };

        let isbn = entry
            .isbn_13
            .clone()
            .or_else(|| entry.isbn_10.clone())
            .unwrap_or_default();

        info!(
            title = %entry.title.as_deref().unwrap_or_default(),
            %isbn,
            score = title_score,
            has_cover = cover_image_url.is_some(),
            "enriched"
        );

        BookDetails {
            author: entry.author_display().unwrap_or_default(),
            isbn,
            isbn_10: entry.isbn_10.clone(),
            isbn_13: entry.isbn_13.clone(),
            cover_image_url,
            amazon_url: entry.amazon_url.clone(),
            google_books_url: entry.info_url.clone(),
            google_books_id: entry.catalog_id.clone(),
            publisher: entry.publisher.clone(),
            published_year: entry.published_year,
            page_count: entry.page_count,
            description: entry.description.clone(),
            categories: entry.categories.clone(),
            verified: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podshelf_core::RecommendationKind;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn mention(title: &str, author: Option<&str>) -> ExtractedMention {
        ExtractedMention {
            kind: RecommendationKind::Book,
            title: title.to_string(),
            author_creator: author.map(String::from),
            context: None,
            quote: None,
            confidence: 0.9,
            recommended_by: Some("Jane Doe".into()),
            timestamp_seconds: None,
        }
    }

    fn pipeline_for(uri: &str) -> EnrichmentPipeline {
        let config = PipelineConfig::default();
        let catalog = CatalogResolver::from_config(&config)
            .unwrap()
            .with_base_url(uri.to_string());
        EnrichmentPipeline::new(&config)
            .unwrap()
            .with_catalog(catalog)
            .without_cover_validation()
    }

    fn deep_work_body() -> serde_json::Value {
        serde_json::json!({
            "items": [{
                "id": "dw1",
                "volumeInfo": {
                    "title": "Deep Work",
                    "authors": ["Cal Newport"],
                    "publishedDate": "2016",
                    "industryIdentifiers": [
                        {"type": "ISBN_13", "identifier": "9781455586691"}
                    ]
                }
            }]
        })
    }

    #[tokio::test]
    async fn test_placeholder_title_rejected_before_network() {
        // Catalog points at a dead address; a network call would error.
        let pipeline = pipeline_for("http://127.0.0.1:1");
        let outcome = pipeline
            .enrich_book(&mention("Not specified", None))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            EnrichmentOutcome::Rejected(RejectReason::MissingTitle)
        ));
    }

    #[tokio::test]
    async fn test_exact_match_accepted_and_verified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(deep_work_body()))
            .mount(&server)
            .await;

        let outcome = pipeline_for(&server.uri())
            .enrich_book(&mention("Deep Work", Some("Cal Newport")))
            .await
            .unwrap();

        let EnrichmentOutcome::Enriched(details) = outcome else {
            panic!("expected enriched outcome");
        };
        assert_eq!(details.isbn, "9781455586691");
        assert_eq!(details.isbn_13.as_deref(), Some("9781455586691"));
        assert_eq!(details.author, "Cal Newport");
        assert!(details.verified);
        assert_eq!(details.published_year, Some(2016));
    }

    #[tokio::test]
    async fn test_unrelated_catalog_title_rejected() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "items": [{
                "id": "x",
                "volumeInfo": {
                    "title": "The Lean Startup",
                    "authors": ["Eric Ries"],
                    "industryIdentifiers": [
                        {"type": "ISBN_13", "identifier": "9780307887894"}
                    ]
                }
            }]
        });
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let outcome = pipeline_for(&server.uri())
            .enrich_book(&mention("Atomic Habits", None))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            EnrichmentOutcome::Rejected(RejectReason::LowTitleScore(_))
        ));
    }

    #[tokio::test]
    async fn test_author_mismatch_rejected() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "items": [{
                "id": "x",
                "volumeInfo": {
                    "title": "Deep Work",
                    "authors": ["Haruki Murakami"],
                    "industryIdentifiers": [
                        {"type": "ISBN_13", "identifier": "9781455586691"}
                    ]
                }
            }]
        });
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let outcome = pipeline_for(&server.uri())
            .enrich_book(&mention("Deep Work", Some("Cal Newport")))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            EnrichmentOutcome::Rejected(RejectReason::LowAuthorScore(_))
        ));
    }

    #[tokio::test]
    async fn test_placeholder_author_is_ignored_not_scored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(deep_work_body()))
            .mount(&server)
            .await;

        let outcome = pipeline_for(&server.uri())
            .enrich_book(&mention("Deep Work", Some("Not mentioned")))
            .await
            .unwrap();
        assert!(outcome.is_enriched());
    }

    #[tokio::test]
    async fn test_missing_isbn_rejected() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "items": [{
                "id": "x",
                "volumeInfo": {
                    "title": "Deep Work",
                    "authors": ["Cal Newport"]
                }
            }]
        });
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let outcome = pipeline_for(&server.uri())
            .enrich_book(&mention("Deep Work", Some("Cal Newport")))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            EnrichmentOutcome::Rejected(RejectReason::MissingRequiredField("isbn"))
        ));
    }

    #[tokio::test]
    async fn test_not_found_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let outcome = pipeline_for(&server.uri())
            .enrich_book(&mention("Completely Unfindable Book", None))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            EnrichmentOutcome::Rejected(RejectReason::NotFound)
        ));
    }
}
