//! Aggregate row counts for the admin dashboard.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::Stats;

#[derive(Debug, sqlx::FromRow)]
struct StatsRow {
    total_profiles: i64,
    total_stores: i64,
    total_ratings: i64,
}

/// Repository for dashboard statistics.
pub struct StatsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Count profiles, stores and ratings in one round trip.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counts(&self) -> Result<Stats, RepositoryError> {
        let row = sqlx::query_as::<_, StatsRow>(
            r"
            SELECT
                (SELECT COUNT(*) FROM ratings.profile) AS total_profiles,
                (SELECT COUNT(*) FROM ratings.store) AS total_stores,
                (SELECT COUNT(*) FROM ratings.rating) AS total_ratings
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(Stats {
            total_profiles: row.total_profiles,
            total_stores: row.total_stores,
            total_ratings: row.total_ratings,
        })
    }
}
