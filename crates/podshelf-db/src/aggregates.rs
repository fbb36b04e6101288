//! Book aggregation: fold persisted recommendations into canonical books.
//!
//! The fold is pure and deterministic over input order; the rebuild is
//! full-replace, clearing existing aggregate rows inside one transaction
//! before inserting the fresh set.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::info;
use uuid::Uuid;

use podshelf_core::{
    AggregateRepository, BookAggregate, EnrichedRecommendation, Error, RecommendationRepository,
    Result,
};

/// Fold book recommendations into aggregates.
///
/// Group key preference: isbn13, then isbn10, then the preferred isbn, then
/// the lower-cased title. Canonical fields come from the first record of
/// each group; `recommended_by` dedups by exact string in first-appearance
/// order; every contributing record counts once.
pub fn fold_aggregates(records: &[EnrichedRecommendation]) -> Vec<BookAggregate> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut aggregates: Vec<BookAggregate> = Vec::new();

    for rec in records {
        let Some(book) = rec.details.as_book() else {
            continue;
        };

        let key = book
            .isbn_13
            .clone()
            .or_else(|| book.isbn_10.clone())
            .or_else(|| {
                if book.isbn.is_empty() {
                    None
                } else {
                    Some(book.isbn.clone())
                }
            })
            .unwrap_or_else(|| rec.title.trim().to_lowercase());

        match index.get(&key) {
            Some(&i) => {
                let agg = &mut aggregates[i];
                agg.recommendation_count += 1;
                agg.recommendation_ids.push(rec.id);
                if let Some(name) = &rec.recommended_by {
                    if !agg.recommended_by.contains(name) {
                        agg.recommended_by.push(name.clone());
                    }
                }
            }
            None => {
                index.insert(key, aggregates.len());
                aggregates.push(BookAggregate {
                    id: Uuid::now_v7(),
                    isbn: if book.isbn.is_empty() {
                        None
                    } else {
                        Some(book.isbn.clone())
                    },
                    isbn_10: book.isbn_10.clone(),
                    isbn_13: book.isbn_13.clone(),
                    title: rec.title.clone(),
                    author: Some(book.author.clone()).filter(|a| !a.is_empty()),
                    cover_image_url: book.cover_image_url.clone(),
                    description: book.description.clone(),
                    amazon_url: book.amazon_url.clone(),
                    google_books_url: book.google_books_url.clone(),
                    google_books_id: book.google_books_id.clone(),
                    categories: book.categories.clone(),
                    page_count: book.page_count,
                    published_year: book.published_year,
                    publisher: book.publisher.clone(),
                    recommended_by: rec.recommended_by.iter().cloned().collect(),
                    recommendation_count: 1,
                    recommendation_ids: vec![rec.id],
                });
            }
        }
    }

    aggregates
}

/// PostgreSQL implementation of AggregateRepository.
pub struct PgAggregateRepository {
    pool: Pool<Postgres>,
}

impl PgAggregateRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> BookAggregate {
        BookAggregate {
            id: row.get("id"),
            isbn: row.get("isbn"),
            isbn_10: row.get("isbn_10"),
            isbn_13: row.get("isbn_13"),
            title: row.get("title"),
            author: row.get("author"),
            cover_image_url: row.get("cover_image_url"),
            description: row.get("description"),
            amazon_url: row.get("amazon_url"),
            google_books_url: row.get("google_books_url"),
            google_books_id: row.get("google_books_id"),
            categories: row.get("categories"),
            page_count: row.get("page_count"),
            published_year: row.get("published_year"),
            publisher: row.get("publisher"),
            recommended_by: row.get("recommended_by"),
            recommendation_count: row.get("recommendation_count"),
            recommendation_ids: row.get("recommendation_ids"),
        }
    }
}

#[async_trait]
impl AggregateRepository for PgAggregateRepository {
    async fn replace_all(&self, aggregates: &[BookAggregate]) -> Result<usize> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query("DELETE FROM book_aggregates")
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        for agg in aggregates {
            sqlx::query(
                "INSERT INTO book_aggregates
                     (id, isbn, isbn_10, isbn_13, title, author, cover_image_url,
                      description, amazon_url, google_books_url, google_books_id,
                      categories, page_count, published_year, publisher,
                      recommended_by, recommendation_count, recommendation_ids)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                         $13, $14, $15, $16, $17, $18)",
            )
            .bind(agg.id)
            .bind(&agg.isbn)
            .bind(&agg.isbn_10)
            .bind(&agg.isbn_13)
            .bind(&agg.title)
            .bind(&agg.author)
            .bind(&agg.cover_image_url)
            .bind(&agg.description)
            .bind(&agg.amazon_url)
            .bind(&agg.google_books_url)
            .bind(&agg.google_books_id)
            .bind(&agg.categories)
            .bind(agg.page_count)
            .bind(agg.published_year)
            .bind(&agg.publisher)
            .bind(&agg.recommended_by)
            .bind(agg.recommendation_count)
            .bind(&agg.recommendation_ids)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(aggregates.len())
    }

    async fn list(&self, limit: i64) -> Result<Vec<BookAggregate>> {
        let rows = sqlx::query(
            "SELECT * FROM book_aggregates ORDER BY recommendation_count DESC, title LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.into_iter().map(Self::parse_row).collect())
    }
}

/// Batch job: recompute all aggregates from persisted book recommendations
/// and replace the aggregate table wholesale.
pub struct AggregationEngine {
    recommendations: Arc<dyn RecommendationRepository>,
    aggregates: Arc<dyn AggregateRepository>,
}

impl AggregationEngine {
    pub fn new(
        recommendations: Arc<dyn RecommendationRepository>,
        aggregates: Arc<dyn AggregateRepository>,
    ) -> Self {
        Self {
            recommendations,
            aggregates,
        }
    }

    /// Rebuild the aggregate set. Returns the number of aggregates written.
    pub async fn rebuild(&self) -> Result<usize> {
        let books = self.recommendations.list_books().await?;
        let aggregates = fold_aggregates(&books);
        let written = self.aggregates.replace_all(&aggregates).await?;
        info!(
            subsystem = "aggregation",
            source_records = books.len(),
            aggregates = written,
            "Aggregates rebuilt"
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use podshelf_core::{BookDetails, RecommendationDetails, RecommendationKind};

    fn book_rec(
        title: &str,
        isbn_13: Option<&str>,
        isbn_10: Option<&str>,
        recommended_by: &str,
    ) -> EnrichedRecommendation {
        let isbn = isbn_13.or(isbn_10).unwrap_or_default().to_string();
        EnrichedRecommendation {
            id: Uuid::now_v7(),
            episode_id: Uuid::nil(),
            kind: RecommendationKind::Book,
            title: title.to_string(),
            recommendation_context: None,
            quote_from_episode: None,
            timestamp_seconds: None,
            recommended_by: Some(recommended_by.to_string()),
            confidence_score: 0.9,
            model_used: None,
            details: RecommendationDetails::Book(BookDetails {
                author: "Author".into(),
                isbn,
                isbn_10: isbn_10.map(String::from),
                isbn_13: isbn_13.map(String::from),
                cover_image_url: None,
                amazon_url: None,
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
    fn test_groups_by_isbn13_never_title() {
        // Same title, different ISBN-13: two aggregates.
        let records = vec![
            book_rec("Deep Work", Some("9781455586691"), None, "Jane"),
            book_rec("Deep Work", Some("9999999999999"), None, "John"),
        ];
        let aggs = fold_aggregates(&records);
        assert_eq!(aggs.len(), 2);
    }

    #[test]
    fn test_same_isbn_different_title_spelling_merges() {
        let records = vec![
            book_rec("Deep Work", Some("9781455586691"), None, "Jane"),
            book_rec("Deep Work: Rules", Some("9781455586691"), None, "John"),
        ];
        let aggs = fold_aggregates(&records);
        assert_eq!(aggs.len(), 1);
        // Canonical fields from the first record.
        assert_eq!(aggs[0].title, "Deep Work");
        assert_eq!(aggs[0].recommendation_count, 2);
        assert_eq!(aggs[0].recommended_by, vec!["Jane", "John"]);
        assert_eq!(aggs[0].recommendation_ids.len(), 2);
    }

    #[test]
    fn test_recommender_dedup_exact_string() {
        let records = vec![
            book_rec("Deep Work", Some("9781455586691"), None, "Jane Doe"),
            book_rec("Deep Work", Some("9781455586691"), None, "Jane Doe"),
            book_rec("Deep Work", Some("9781455586691"), None, "jane doe"),
        ];
        let aggs = fold_aggregates(&records);
        assert_eq!(aggs[0].recommendation_count, 3);
        // Exact-string dedup, not fuzzy: case variant stays.
        assert_eq!(aggs[0].recommended_by, vec!["Jane Doe", "jane doe"]);
    }

    #[test]
    fn test_title_key_fallback_when_no_isbn() {
        let mut rec = book_rec("Untracked Book", None, None, "Jane");
        if let RecommendationDetails::Book(b) = &mut rec.details {
            b.isbn = String::new();
        }
        let mut rec2 = book_rec("untracked book ", None, None, "John");
        if let RecommendationDetails::Book(b) = &mut rec2.details {
            b.isbn = String::new();
        }
        let aggs = fold_aggregates(&[rec, rec2]);
        assert_eq!(aggs.len(), 1);
        assert_eq!(aggs[0].recommendation_count, 2);
    }

    #[test]
    fn test_rerun_is_deterministic() {
        let records = vec![
            book_rec("A", Some("9781455586691"), None, "Jane"),
            book_rec("B", Some("9780307887894"), None, "John"),
            book_rec("A", Some("9781455586691"), None, "Alice"),
        ];
        let first = fold_aggregates(&records);
        let second = fold_aggregates(&records);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.recommendation_count, b.recommendation_count);
            assert_eq!(a.recommended_by, b.recommended_by);
            assert_eq!(a.recommendation_ids, b.recommendation_ids);
        }
    }

    #[test]
    fn test_non_book_details_skipped() {
        let mut rec = book_rec("Some Movie", None, None, "Jane");
        rec.kind = RecommendationKind::Movie;
        rec.details = RecommendationDetails::Movie(Default::default());
        assert!(fold_aggregates(&[rec]).is_empty());
    }
}
