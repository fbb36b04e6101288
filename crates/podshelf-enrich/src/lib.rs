//! Catalog enrichment for extracted recommendation mentions.
//!
//! Books are matched against the bibliographic catalog with similarity
//! scoring and enriched with ISBNs, cover images, and purchase links;
//! movies go through the movie database when configured. Rejections are
//! first-class outcomes with reasons, not errors.

pub mod catalog;
pub mod cover;
pub mod display;
pub mod isbn;
pub mod movie;
pub mod pipeline;
pub mod scorer;

pub use catalog::CatalogResolver;
pub use cover::{CoverImageResolver, CoverRejection, CoverValidation};
pub use movie::MovieResolver;
pub use pipeline::{EnrichmentOutcome, EnrichmentPipeline, RejectReason};
