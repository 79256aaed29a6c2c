//! Rating repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use store_ratings_core::{Email, Name, ProfileId, RatingId, Score, StoreId};

use super::{RepositoryError, corrupt};
use crate::models::{Rating, RatingWithRater};

/// Unique constraint on `(rater_id, store_id)`.
pub const RATER_STORE_UNIQUE: &str = "rating_rater_store_unique";

const RATING_COLUMNS: &str = "id, rater_id, store_id, score, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct RatingRow {
    id: RatingId,
    rater_id: ProfileId,
    store_id: StoreId,
    score: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RatingRow> for Rating {
    type Error = RepositoryError;

    fn try_from(row: RatingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            rater_id: row.rater_id,
            store_id: row.store_id,
            score: Score::try_from(i64::from(row.score)).map_err(|e| corrupt("score", e))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RatingWithRaterRow {
    #[sqlx(flatten)]
    rating: RatingRow,
    rater_name: String,
    rater_email: String,
}

impl TryFrom<RatingWithRaterRow> for RatingWithRater {
    type Error = RepositoryError;

    fn try_from(row: RatingWithRaterRow) -> Result<Self, Self::Error> {
        Ok(Self {
            rating: row.rating.try_into()?,
            rater_name: Some(Name::parse(&row.rater_name).map_err(|e| corrupt("rater name", e))?),
            rater_email: Some(
                Email::parse(&row.rater_email).map_err(|e| corrupt("rater email", e))?,
            ),
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for rating database operations.
pub struct RatingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RatingRepository<'a> {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the rating a profile gave a store, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_pair(
        &self,
        rater_id: ProfileId,
        store_id: StoreId,
    ) -> Result<Option<Rating>, RepositoryError> {
        let row = sqlx::query_as::<_, RatingRow>(&format!(
            "SELECT {RATING_COLUMNS} FROM ratings.rating WHERE rater_id = $1 AND store_id = $2"
        ))
        .bind(rater_id)
        .bind(store_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert a rating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` carrying [`RATER_STORE_UNIQUE`] if
    /// the pair already has a rating.
    /// Returns `RepositoryError::MissingReference` if the rater or store does not exist.
    pub async fn insert(
        &self,
        rater_id: ProfileId,
        store_id: StoreId,
        score: Score,
    ) -> Result<Rating, RepositoryError> {
        let row = sqlx::query_as::<_, RatingRow>(&format!(
            r"
            INSERT INTO ratings.rating (rater_id, store_id, score)
            VALUES ($1, $2, $3)
            RETURNING {RATING_COLUMNS}
            "
        ))
        .bind(rater_id)
        .bind(store_id)
        .bind(score)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Replace the score of an existing rating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the rating does not exist.
    pub async fn update_score(&self, id: RatingId, score: Score) -> Result<Rating, RepositoryError> {
        let row = sqlx::query_as::<_, RatingRow>(&format!(
            "UPDATE ratings.rating SET score = $2 WHERE id = $1 RETURNING {RATING_COLUMNS}"
        ))
        .bind(id)
        .bind(score)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete a rating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: RatingId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM ratings.rating WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List a store's ratings with rater name and email, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_store(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<RatingWithRater>, RepositoryError> {
        let rows = sqlx::query_as::<_, RatingWithRaterRow>(
            r"
            SELECT r.id, r.rater_id, r.store_id, r.score, r.created_at, r.updated_at,
                   p.name AS rater_name, p.email AS rater_email
            FROM ratings.rating r
            JOIN ratings.profile p ON p.id = r.rater_id
            WHERE r.store_id = $1
            ORDER BY r.updated_at DESC, r.id DESC
            ",
        )
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List the ratings a profile has given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_rater(&self, rater_id: ProfileId) -> Result<Vec<Rating>, RepositoryError> {
        let rows = sqlx::query_as::<_, RatingRow>(&format!(
            "SELECT {RATING_COLUMNS} FROM ratings.rating WHERE rater_id = $1 ORDER BY store_id"
        ))
        .bind(rater_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
