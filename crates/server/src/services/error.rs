//! Service-level error taxonomy.

use thiserror::Error;

use store_ratings_core::{PolicyDenied, ValidationError};

use crate::db::RepositoryError;

/// Errors returned by policy-checked service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A field constraint was violated.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The row policy refused a write.
    #[error(transparent)]
    PermissionDenied(#[from] PolicyDenied),

    /// The row does not exist or is not visible to the caller.
    #[error("not found")]
    NotFound,

    /// Storage failed for a reason unrelated to the request's content.
    #[error("storage error: {0}")]
    Storage(RepositoryError),
}

impl ServiceError {
    /// Whether retrying the same request later could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(err) if err.is_transient())
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Invalid(validation) => Self::Validation(validation),
            RepositoryError::Conflict(constraint) => {
                Self::Validation(ValidationError::from_constraint(&constraint))
            }
            RepositoryError::NotFound | RepositoryError::MissingReference(_) => Self::NotFound,
            other => Self::Storage(other),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_pair_becomes_validation_error() {
        let err = ServiceError::from(RepositoryError::Conflict(
            "rating_rater_store_unique".to_owned(),
        ));
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::DuplicateRating)
        ));
    }

    #[test]
    fn test_missing_reference_is_not_found() {
        let err = ServiceError::from(RepositoryError::MissingReference(
            "rating_store_id_fkey".to_owned(),
        ));
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[test]
    fn test_pool_timeout_is_transient() {
        let err = ServiceError::from(RepositoryError::from(sqlx::Error::PoolTimedOut));
        assert!(err.is_transient());
        assert!(!ServiceError::NotFound.is_transient());
    }
}
