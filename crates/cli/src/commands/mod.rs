//! CLI subcommands.

pub mod admin;
pub mod migrate;

use secrecy::SecretString;
use thiserror::Error;

use store_ratings_core::ValidationError;
use store_ratings_server::services::AuthError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying migrations failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// An argument failed validation.
    #[error("Invalid argument: {0}")]
    Invalid(#[from] ValidationError),

    /// Account creation failed.
    #[error("Account error: {0}")]
    Auth(#[from] AuthError),
}

/// Database URL from `RATINGS_DATABASE_URL`, falling back to `DATABASE_URL`.
fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("RATINGS_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("RATINGS_DATABASE_URL"))
}
