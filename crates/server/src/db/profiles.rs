//! Profile repository.
//!
//! [`ProfileRepository::get_by_account_id`] is the privileged lookup used to
//! resolve a caller's role. It reads exactly one row and never consults the
//! policy layer.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use store_ratings_core::{AccountId, Email, Name, ProfileAddress, ProfileId, Role};

use super::{RepositoryError, corrupt, like_pattern};
use crate::models::{Profile, ProfileFilter, ProfileUpdate};

const PROFILE_COLUMNS: &str =
    "id, account_id, name, email, address, role, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: ProfileId,
    account_id: AccountId,
    name: String,
    email: String,
    address: Option<String>,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = RepositoryError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            account_id: row.account_id,
            name: Name::parse(&row.name).map_err(|e| corrupt("profile name", e))?,
            email: Email::parse(&row.email).map_err(|e| corrupt("profile email", e))?,
            address: row
                .address
                .as_deref()
                .map(ProfileAddress::parse)
                .transpose()
                .map_err(|e| corrupt("profile address", e))?,
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for profile database operations.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the profile belonging to an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_account_id(
        &self,
        account_id: AccountId,
    ) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM ratings.profile WHERE account_id = $1"
        ))
        .bind(account_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a profile by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_id(&self, id: ProfileId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM ratings.profile WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List profiles matching a filter.
    ///
    /// Empty text filters are ignored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ProfileFilter) -> Result<Vec<Profile>, RepositoryError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {PROFILE_COLUMNS} FROM ratings.profile WHERE TRUE"
        ));

        for (column, value) in [
            ("name", &filter.name),
            ("email", &filter.email),
            ("address", &filter.address),
        ] {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                qb.push(format!(" AND {column} ILIKE "))
                    .push_bind(like_pattern(value));
            }
        }
        if let Some(role) = filter.role {
            qb.push(" AND role = ").push_bind(role);
        }
        qb.push(format!(
            " ORDER BY {} {} NULLS LAST, id",
            filter.sort.column(),
            filter.order.keyword()
        ));

        let rows = qb
            .build_query_as::<ProfileRow>()
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    /// Returns `RepositoryError::Invalid` if a CHECK constraint rejects the row.
    pub async fn update(
        &self,
        id: ProfileId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        let (set_address, address) = match &update.address {
            Some(address) => (true, address.as_ref()),
            None => (false, None),
        };

        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r"
            UPDATE ratings.profile
            SET name = COALESCE($2, name),
                address = CASE WHEN $3 THEN $4 ELSE address END,
                role = COALESCE($5, role)
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(update.name.as_ref())
        .bind(set_address)
        .bind(address)
        .bind(update.role)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }
}

/// Insert the profile for a new account unless one already exists.
///
/// Returns `None` when a profile for `account_id` was already present.
///
/// # Errors
///
/// Returns `RepositoryError::MissingReference` if the account does not exist.
/// Returns `RepositoryError::Invalid` if a CHECK constraint rejects the row.
pub async fn insert_if_absent(
    conn: &mut PgConnection,
    account_id: AccountId,
    name: &Name,
    email: &Email,
    address: Option<&ProfileAddress>,
    role: Role,
) -> Result<Option<Profile>, RepositoryError> {
    let row = sqlx::query_as::<_, ProfileRow>(&format!(
        r"
        INSERT INTO ratings.profile (account_id, name, email, address, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (account_id) DO NOTHING
        RETURNING {PROFILE_COLUMNS}
        "
    ))
    .bind(account_id)
    .bind(name)
    .bind(email)
    .bind(address)
    .bind(role)
    .fetch_optional(conn)
    .await?;

    row.map(TryInto::try_into).transpose()
}

/// Get the profile of an account on an existing connection.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_account_id(
    conn: &mut PgConnection,
    account_id: AccountId,
) -> Result<Option<Profile>, RepositoryError> {
    let row = sqlx::query_as::<_, ProfileRow>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM ratings.profile WHERE account_id = $1"
    ))
    .bind(account_id)
    .fetch_optional(conn)
    .await?;

    row.map(TryInto::try_into).transpose()
}

/// Lock a profile row for deletion and return its account.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_account_id(
    conn: &mut PgConnection,
    id: ProfileId,
) -> Result<Option<AccountId>, RepositoryError> {
    let account_id = sqlx::query_scalar::<_, AccountId>(
        "SELECT account_id FROM ratings.profile WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(account_id)
}
