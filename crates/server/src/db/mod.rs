//! Database operations for Store Ratings `PostgreSQL`.
//!
//! # Schema: `ratings`
//!
//! ## Tables
//!
//! - `account` - Authentication boundary (email + password hash)
//! - `profile` - One per account; name, email, address, role
//! - `store` - Rated stores, owned by a profile
//! - `rating` - One 1-5 score per (rater, store)
//!
//! ## Views
//!
//! - `store_rating_summary` - Store columns plus live average and count
//!
//! Sessions live in `tower_sessions.session`.
//!
//! Repositories here are raw storage: they never check the caller. Every
//! request-facing path goes through [`crate::services`], which evaluates the
//! row policies first.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p store-ratings-cli -- migrate
//! ```

pub mod accounts;
pub mod profiles;
pub mod ratings;
pub mod stats;
pub mod stores;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use store_ratings_core::ValidationError;

pub use accounts::AccountRepository;
pub use profiles::ProfileRepository;
pub use ratings::RatingRepository;
pub use stats::StatsRepository;
pub use stores::StoreRepository;

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";
/// SQLSTATE for `check_violation`.
const CHECK_VIOLATION: &str = "23514";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx that is not a constraint violation.
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation; carries the constraint name.
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A referenced row does not exist; carries the constraint name.
    #[error("missing referenced row: {0}")]
    MissingReference(String),

    /// A CHECK constraint rejected the row.
    #[error("check violation: {0}")]
    Invalid(ValidationError),
}

impl RepositoryError {
    /// Whether the failure is a pool timeout, I/O error or closed pool.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Database(
                sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::Io(_)
                    | sqlx::Error::WorkerCrashed
            )
        )
    }

    /// Whether this is a unique violation of the named constraint.
    #[must_use]
    pub fn is_conflict_on(&self, constraint: &str) -> bool {
        matches!(self, Self::Conflict(name) if name == constraint)
    }
}

impl From<sqlx::Error> for RepositoryError {
    /// Classify constraint violations by SQLSTATE; everything else stays a
    /// database error.
    fn from(err: sqlx::Error) -> Self {
        let sqlx::Error::Database(ref db_err) = err else {
            return Self::Database(err);
        };

        let constraint = db_err.constraint().unwrap_or_default().to_owned();
        let code = db_err.code().map(std::borrow::Cow::into_owned);
        match code.as_deref() {
            Some(UNIQUE_VIOLATION) => Self::Conflict(constraint),
            Some(FOREIGN_KEY_VIOLATION) => Self::MissingReference(constraint),
            Some(CHECK_VIOLATION) => Self::Invalid(ValidationError::from_constraint(&constraint)),
            _ => Self::Database(err),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
pub(crate) fn like_pattern(input: &str) -> String {
    let mut pattern = String::with_capacity(input.len() + 2);
    pattern.push('%');
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Map a text column that failed domain validation.
pub(crate) fn corrupt(column: &str, err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::DataCorruption(format!("invalid {column} in database: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("bakery"), "%bakery%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }

    #[test]
    fn test_transient_classification() {
        assert!(RepositoryError::from(sqlx::Error::PoolTimedOut).is_transient());
        assert!(RepositoryError::from(sqlx::Error::PoolClosed).is_transient());
        assert!(!RepositoryError::from(sqlx::Error::RowNotFound).is_transient());
        assert!(!RepositoryError::NotFound.is_transient());
    }

    #[test]
    fn test_is_conflict_on() {
        let err = RepositoryError::Conflict("rating_rater_store_unique".to_owned());
        assert!(err.is_conflict_on("rating_rater_store_unique"));
        assert!(!err.is_conflict_on("account_email_key"));
    }
}
