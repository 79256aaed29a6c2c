//! Authentication error types.

use thiserror::Error;

use store_ratings_core::{PolicyDenied, ValidationError};

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email, password or profile field failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Invalid credentials (wrong password or unknown email).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Account not found.
    #[error("account not found")]
    AccountNotFound,

    /// An account with this email already exists.
    #[error("account already exists")]
    AccountAlreadyExists,

    /// The caller may not create accounts.
    #[error(transparent)]
    PermissionDenied(#[from] PolicyDenied),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
