//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`.
//!
//! Responses are JSON: `{"error": "...", "field": "..."}`, where `field` is
//! present only for validation failures.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use store_ratings_core::{Field, ValidationError};

use crate::db::RepositoryError;
use crate::services::{AuthError, ServiceError};

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Policy-checked operation failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Database operation outside a service failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Well-formed request body with invalid values.
    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<Field>,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Service(err) => service_status(err),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::AccountAlreadyExists => StatusCode::CONFLICT,
                AuthError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AuthError::PermissionDenied(_) => StatusCode::FORBIDDEN,
                AuthError::AccountNotFound => StatusCode::NOT_FOUND,
                AuthError::Repository(err) => repository_status(err),
                AuthError::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Database(err) => repository_status(err),
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Service(ServiceError::Validation(err)) | Self::Auth(AuthError::Validation(err)) => {
                Some(err)
            }
            _ => None,
        }
    }
}

fn service_status(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        ServiceError::NotFound => StatusCode::NOT_FOUND,
        ServiceError::Storage(err) => repository_status(err),
    }
}

const fn repository_status(err: &RepositoryError) -> StatusCode {
    if err.is_transient() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let error = match (&self, status) {
            (_, StatusCode::SERVICE_UNAVAILABLE) => {
                "Service temporarily unavailable, please retry".to_string()
            }
            (_, s) if s.is_server_error() => "Internal server error".to_string(),
            (Self::Service(ServiceError::PermissionDenied(_)) | Self::Auth(AuthError::PermissionDenied(_)), _) => {
                "Permission denied".to_string()
            }
            (Self::Service(err), _) => err.to_string(),
            (Self::Auth(AuthError::InvalidCredentials), _) => "Invalid credentials".to_string(),
            (Self::Auth(AuthError::AccountAlreadyExists), _) => {
                "An account with this email already exists".to_string()
            }
            (Self::Auth(err), _) => err.to_string(),
            (Self::Unauthorized(msg) | Self::BadRequest(msg) | Self::Unprocessable(msg), _) => {
                msg.clone()
            }
            _ => self.to_string(),
        };

        let body = ErrorBody {
            error,
            field: self.validation().map(ValidationError::field),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => Self::Unprocessable(err.body_text()),
            other => Self::BadRequest(other.body_text()),
        }
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session error: {err}"))
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the authenticated caller.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use store_ratings_core::{Operation, PolicyDenied, Resource};

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_is_unprocessable_with_field() {
        let (status, body) = body_json(AppError::Service(ServiceError::Validation(
            ValidationError::ScoreOutOfRange(6),
        )))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["field"], "score");
    }

    #[tokio::test]
    async fn test_permission_denied_is_forbidden() {
        let denied = PolicyDenied {
            operation: Operation::Update,
            resource: Resource::Statistics,
        };
        let (status, body) = body_json(ServiceError::PermissionDenied(denied).into()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Permission denied");
        assert!(body.get("field").is_none());
    }

    #[tokio::test]
    async fn test_transient_storage_is_unavailable_and_generic() {
        let err: AppError = ServiceError::from(RepositoryError::from(sqlx::Error::PoolTimedOut)).into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!body["error"].as_str().unwrap().contains("pool"));
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let (status, body) = body_json(AppError::Internal("secret detail".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Service(ServiceError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Auth(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Auth(AuthError::AccountAlreadyExists).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::BadRequest("x".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
