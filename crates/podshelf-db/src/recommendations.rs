//! Recommendation repository implementation.
//!
//! Kind-specific detail payloads are stored as one JSONB column and decoded
//! back into the matching detail variant using the row's kind, so a book
//! row never silently deserializes as a movie.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use podshelf_core::{
    EnrichedRecommendation, Error, RecommendationDetails, RecommendationKind,
    RecommendationRepository, Result,
};

/// PostgreSQL implementation of RecommendationRepository.
pub struct PgRecommendationRepository {
    pool: Pool<Postgres>,
}

impl PgRecommendationRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> Result<EnrichedRecommendation> {
        let kind = RecommendationKind::from_str_lossy(row.get("kind"));
        let details_json: JsonValue = row.get("details");
        Ok(EnrichedRecommendation {
            id: row.get("id"),
            episode_id: row.get("episode_id"),
            kind,
            title: row.get("title"),
            recommendation_context: row.get("recommendation_context"),
            quote_from_episode: row.get("quote_from_episode"),
            timestamp_seconds: row.get("timestamp_seconds"),
            recommended_by: row.get("recommended_by"),
            confidence_score: row.get("confidence_score"),
            model_used: row.get("model_used"),
            details: details_from_json(kind, details_json)?,
            created_at: row.get("created_at"),
        })
    }
}

/// Decode a details payload by the row's declared kind.
fn details_from_json(kind: RecommendationKind, json: JsonValue) -> Result<RecommendationDetails> {
    let details = match kind {
        RecommendationKind::Book => RecommendationDetails::Book(serde_json::from_value(json)?),
        RecommendationKind::Movie | RecommendationKind::TvShow => {
            RecommendationDetails::Movie(serde_json::from_value(json)?)
        }
        RecommendationKind::Product | RecommendationKind::App => {
            RecommendationDetails::Product(serde_json::from_value(json)?)
        }
        _ => RecommendationDetails::None(Default::default()),
    };
    Ok(details)
}

#[async_trait]
impl RecommendationRepository for PgRecommendationRepository {
    async fn insert(&self, rec: &EnrichedRecommendation) -> Result<Uuid> {
        let details = serde_json::to_value(&rec.details)?;
        sqlx::query(
            "INSERT INTO recommendations
                 (id, episode_id, kind, title, recommendation_context,
                  quote_from_episode, timestamp_seconds, recommended_by,
                  confidence_score, model_used, details, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(rec.id)
        .bind(rec.episode_id)
        .bind(rec.kind.as_str())
        .bind(&rec.title)
        .bind(&rec.recommendation_context)
        .bind(&rec.quote_from_episode)
        .bind(rec.timestamp_seconds)
        .bind(&rec.recommended_by)
        .bind(rec.confidence_score)
        .bind(&rec.model_used)
        .bind(&details)
        .bind(rec.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "recommendations",
            recommendation_id = %rec.id,
            episode_id = %rec.episode_id,
            kind = rec.kind.as_str(),
            title = %rec.title,
            "Recommendation inserted"
        );
        Ok(rec.id)
    }

    async fn list_for_episode(&self, episode_id: Uuid) -> Result<Vec<EnrichedRecommendation>> {
        let rows = sqlx::query(
            "SELECT * FROM recommendations WHERE episode_id = $1 ORDER BY created_at, id",
        )
        .bind(episode_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        rows.into_iter().map(Self::parse_row).collect()
    }

    async fn list_books(&self) -> Result<Vec<EnrichedRecommendation>> {
        // Persisted insertion order: aggregation depends on deterministic
        // iteration for first-record-wins canonical fields.
        let rows =
            sqlx::query("SELECT * FROM recommendations WHERE kind = 'book' ORDER BY created_at, id")
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;
        rows.into_iter().map(Self::parse_row).collect()
    }

    async fn delete_for_episode(&self, episode_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM recommendations WHERE episode_id = $1")
            .bind(episode_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podshelf_core::{BookDetails, MovieDetails};

    #[test]
    fn test_details_decode_by_kind() {
        let book_json = serde_json::json!({
            "author": "Cal Newport",
            "isbn": "9781455586691",
            "isbn13": "9781455586691",
            "verified": true
        });
        let details = details_from_json(RecommendationKind::Book, book_json).unwrap();
        let book: &BookDetails = details.as_book().unwrap();
        assert_eq!(book.author, "Cal Newport");

        let movie_json = serde_json::json!({"tmdbId": 42});
        let details = details_from_json(RecommendationKind::Movie, movie_json).unwrap();
        match details {
            RecommendationDetails::Movie(MovieDetails { tmdb_id, .. }) => {
                assert_eq!(tmdb_id, Some(42));
            }
            _ => panic!("expected movie details"),
        }
    }

    #[test]
    fn test_unenriched_kind_decodes_empty() {
        let details =
            details_from_json(RecommendationKind::Website, serde_json::json!({})).unwrap();
        assert!(matches!(details, RecommendationDetails::None(_)));
    }
}
