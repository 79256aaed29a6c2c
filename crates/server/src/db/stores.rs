//! Store repository and the `store_rating_summary` view.
//!
//! Summaries are read straight from the view, so the average and count are
//! recomputed by `PostgreSQL` on every query.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use store_ratings_core::{Email, Name, ProfileId, StoreAddress, StoreId};

use super::{RepositoryError, corrupt, like_pattern};
use crate::models::{NewStore, Store, StoreFilter, StoreRatingSummary, StoreUpdate};

const STORE_COLUMNS: &str = "id, owner_id, name, email, address, created_at, updated_at";
const SUMMARY_COLUMNS: &str =
    "id, owner_id, name, email, address, created_at, updated_at, average_rating, total_ratings";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: StoreId,
    owner_id: ProfileId,
    name: String,
    email: String,
    address: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            owner_id: row.owner_id,
            name: Name::parse(&row.name).map_err(|e| corrupt("store name", e))?,
            email: Email::parse(&row.email).map_err(|e| corrupt("store email", e))?,
            address: StoreAddress::parse(&row.address).map_err(|e| corrupt("store address", e))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    #[sqlx(flatten)]
    store: StoreRow,
    average_rating: Decimal,
    total_ratings: i64,
}

impl TryFrom<SummaryRow> for StoreRatingSummary {
    type Error = RepositoryError;

    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            store: row.store.try_into()?,
            average_rating: row.average_rating.normalize(),
            total_ratings: row.total_ratings,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a store by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM ratings.store WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get one store with its rating summary.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_summary(
        &self,
        id: StoreId,
    ) -> Result<Option<StoreRatingSummary>, RepositoryError> {
        let row = sqlx::query_as::<_, SummaryRow>(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM ratings.store_rating_summary WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get the earliest-created store owned by a profile, with its summary.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_summary_by_owner(
        &self,
        owner_id: ProfileId,
    ) -> Result<Option<StoreRatingSummary>, RepositoryError> {
        let row = sqlx::query_as::<_, SummaryRow>(&format!(
            r"
            SELECT {SUMMARY_COLUMNS}
            FROM ratings.store_rating_summary
            WHERE owner_id = $1
            ORDER BY created_at, id
            LIMIT 1
            "
        ))
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List store summaries matching a filter.
    ///
    /// Empty text filters are ignored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_summaries(
        &self,
        filter: &StoreFilter,
    ) -> Result<Vec<StoreRatingSummary>, RepositoryError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {SUMMARY_COLUMNS} FROM ratings.store_rating_summary WHERE TRUE"
        ));

        for (column, value) in [("name", &filter.name), ("address", &filter.address)] {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                qb.push(format!(" AND {column} ILIKE "))
                    .push_bind(like_pattern(value));
            }
        }
        qb.push(format!(
            " ORDER BY {} {}, id",
            filter.sort.column(),
            filter.order.keyword()
        ));

        let rows = qb
            .build_query_as::<SummaryRow>()
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Insert a new store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::MissingReference` if the owner does not exist.
    /// Returns `RepositoryError::Invalid` if a CHECK constraint rejects the row.
    pub async fn create(&self, store: &NewStore) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            INSERT INTO ratings.store (owner_id, name, email, address)
            VALUES ($1, $2, $3, $4)
            RETURNING {STORE_COLUMNS}
            "
        ))
        .bind(store.owner_id)
        .bind(&store.name)
        .bind(&store.email)
        .bind(&store.address)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store does not exist.
    /// Returns `RepositoryError::MissingReference` if the new owner does not exist.
    pub async fn update(&self, id: StoreId, update: &StoreUpdate) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            UPDATE ratings.store
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                address = COALESCE($4, address),
                owner_id = COALESCE($5, owner_id)
            WHERE id = $1
            RETURNING {STORE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(update.name.as_ref())
        .bind(update.email.as_ref())
        .bind(update.address.as_ref())
        .bind(update.owner_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete a store; its ratings cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: StoreId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM ratings.store WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
