//! Display-readiness validation for persisted book records.
//!
//! A book is only surfaced to readers when everything a card needs is
//! present: real title, real recommender, author, ISBN, purchase link, and
//! a validated cover. Records failing this stay persisted but hidden.

use podshelf_core::{is_placeholder, EnrichedRecommendation};

/// Fields a displayable book record is missing, by name.
pub fn missing_display_fields(rec: &EnrichedRecommendation) -> Vec<&'static str> {
    let mut missing = Vec::new();

    if rec.title.trim().is_empty() || is_placeholder(&rec.title) {
        missing.push("title");
    }
    match rec.recommended_by.as_deref() {
        Some(name) if !is_placeholder(name) => {}
        _ => missing.push("recommended_by"),
    }

    match rec.details.as_book() {
        Some(book) => {
            if book.author.trim().is_empty() || is_placeholder(&book.author) {
                missing.push("author");
            }
            if book.isbn.trim().is_empty() {
                missing.push("isbn");
            }
            if book.amazon_url.is_none() {
                missing.push("amazon_url");
            }
            if book.cover_image_url.is_none() {
                missing.push("cover_image_url");
            }
        }
        None => missing.push("book_details"),
    }

    missing
}

/// True when the record has everything needed for display.
pub fn is_display_ready(rec: &EnrichedRecommendation) -> bool {
    missing_display_fields(rec).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use podshelf_core::{BookDetails, RecommendationDetails, RecommendationKind};
    use uuid::Uuid;

    fn book_record(recommended_by: Option<&str>, cover: Option<&str>) -> EnrichedRecommendation {
        EnrichedRecommendation {
            id: Uuid::nil(),
            episode_id: Uuid::nil(),
            kind: RecommendationKind::Book,
            title: "Deep Work".into(),
            recommendation_context: None,
            quote_from_episode: None,
            timestamp_seconds: None,
            recommended_by: recommended_by.map(String::from),
            confidence_score: 0.9,
            model_used: None,
            details: RecommendationDetails::Book(BookDetails {
                author: "Cal Newport".into(),
                isbn: "9781455586691".into(),
                isbn_10: None,
                isbn_13: Some("9781455586691".into()),
                cover_image_url: cover.map(String::from),
                amazon_url: Some("https://www.amazon.com/s?k=Deep%20Work".into()),
                google_books_url: None,
                google_books_id: None,
                publisher: None,
                published_year: None,
                page_count: None,
                description: None,
                categories: vec![],
                verified: true,
            }),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_complete_record_is_ready() {
        let rec = book_record(Some("Jane Doe"), Some("https://example.com/c.jpg"));
        assert!(is_display_ready(&rec));
    }

    #[test]
    fn test_placeholder_recommender_blocks_display() {
        let rec = book_record(Some("Guest 1"), Some("https://example.com/c.jpg"));
        assert_eq!(missing_display_fields(&rec), vec!["recommended_by"]);
    }

    #[test]
    fn test_missing_cover_blocks_display() {
        let rec = book_record(Some("Jane Doe"), None);
        assert_eq!(missing_display_fields(&rec), vec!["cover_image_url"]);
    }
}
