//! Authentication extractors.
//!
//! The session holds a [`CurrentUser`]; the [`Caller`] (profile id and role)
//! is resolved per request through the [`CallerCache`](crate::services::CallerCache).

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use store_ratings_core::Caller;

use crate::error::{AppError, set_sentry_user};
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Extractor that requires a logged-in account.
///
/// Rejects with `401 Unauthorized` when the session has no user.
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_user(parts)
            .await
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// Extractor that requires a logged-in account with a provisioned profile.
///
/// ```rust,ignore
/// async fn handler(RequireCaller(caller): RequireCaller) -> impl IntoResponse {
///     format!("role: {}", caller.role)
/// }
/// ```
pub struct RequireCaller(pub Caller);

impl FromRequestParts<AppState> for RequireCaller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        let caller = state
            .callers()
            .resolve(state.pool(), user.account_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account has no profile".to_string()))?;

        set_sentry_user(&caller.profile_id, Some(user.email.as_str()));
        Ok(Self(caller))
    }
}

/// Extractor that resolves the caller when there is one.
///
/// Anonymous requests (and accounts without a profile) yield `None`.
pub struct OptionalCaller(pub Option<Caller>);

impl FromRequestParts<AppState> for OptionalCaller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(user) = session_user(parts).await else {
            return Ok(Self(None));
        };
        let caller = state
            .callers()
            .resolve(state.pool(), user.account_id)
            .await?;
        Ok(Self(caller))
    }
}

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    parts
        .extensions
        .get::<Session>()?
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Store the logged-in account in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Clear the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
