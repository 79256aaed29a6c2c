//! Account repository.
//!
//! Accounts are the authentication boundary; profiles hang off them. Inserts
//! and deletes take a connection so they can share a transaction with the
//! profile write they belong to.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use store_ratings_core::{AccountId, Email};

use super::{RepositoryError, corrupt};
use crate::models::Account;

/// Unique index on `lower(email)`.
pub const EMAIL_UNIQUE: &str = "account_email_key";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: AccountId,
    email: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            email: Email::parse(&row.email).map_err(|e| corrupt("email", e))?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    account: AccountRow,
    password_hash: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for account database operations.
pub struct AccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an account together with its password hash, matching the email
    /// case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r"
            SELECT id, email, created_at, password_hash
            FROM ratings.account
            WHERE lower(email) = lower($1)
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| Ok((r.account.try_into()?, r.password_hash)))
            .transpose()
    }

    /// Get the password hash of an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(&self, id: AccountId) -> Result<Option<String>, RepositoryError> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM ratings.account WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(hash)
    }

    /// Replace an account's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist.
    pub async fn update_password(
        &self,
        id: AccountId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE ratings.account SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Insert a new account.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` carrying [`EMAIL_UNIQUE`] if the email
/// is taken.
pub async fn insert(
    conn: &mut PgConnection,
    id: AccountId,
    email: &Email,
    password_hash: &str,
) -> Result<Account, RepositoryError> {
    let row = sqlx::query_as::<_, AccountRow>(
        r"
        INSERT INTO ratings.account (id, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING id, email, created_at
        ",
    )
    .bind(id)
    .bind(email)
    .bind(password_hash)
    .fetch_one(conn)
    .await?;

    row.try_into()
}

/// Delete an account; its profile, stores and ratings cascade.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn delete(conn: &mut PgConnection, id: AccountId) -> Result<bool, RepositoryError> {
    let result = sqlx::query("DELETE FROM ratings.account WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() > 0)
}
