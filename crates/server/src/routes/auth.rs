//! Authentication route handlers.
//!
//! Registration and login store a [`CurrentUser`] in the session; the role is
//! resolved per request and never trusted from the client.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;

use store_ratings_core::{Name, ProfileAddress, Role};

use super::Json;
use crate::error::{AppError, Result, clear_sentry_user};
use crate::middleware::{RequireAuth, RequireCaller, clear_current_user, set_current_user};
use crate::models::{CurrentUser, Profile};
use crate::services::provisioning::ProvisionedFields;
use crate::services::{AuthService, ProfileService};
use crate::state::AppState;

/// Self-registration body. New accounts are always `normal_user`.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: Name,
    pub email: String,
    #[serde(default)]
    pub address: Option<ProfileAddress>,
    pub password: String,
}

/// Login body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password change body.
#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// POST /api/auth/register
///
/// # Errors
///
/// Returns 422 for invalid fields or a weak password, 409 if the email is taken.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Profile>)> {
    let metadata = ProvisionedFields {
        name: body.name,
        role: Role::NormalUser,
        address: body.address,
    }
    .into_metadata();

    let (account, profile) = AuthService::new(state.pool())
        .register(&body.email, &body.password, &metadata)
        .await?;

    set_current_user(
        &session,
        &CurrentUser {
            account_id: account.id,
            email: account.email,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(profile)))
}

/// POST /api/auth/login
///
/// # Errors
///
/// Returns 401 for a wrong email or password.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Profile>> {
    let account = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    let caller = state
        .callers()
        .resolve(state.pool(), account.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account has no profile".to_string()))?;

    set_current_user(
        &session,
        &CurrentUser {
            account_id: account.id,
            email: account.email,
        },
    )
    .await?;
    tracing::info!(profile_id = %caller.profile_id, "Logged in");

    let profile = ProfileService::new(state.pool(), state.callers())
        .get_own(&caller)
        .await?;
    Ok(Json(profile))
}

/// POST /api/auth/logout
///
/// # Errors
///
/// Returns 500 if the session store fails.
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/me
///
/// # Errors
///
/// Returns 401 when not logged in.
pub async fn me(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
) -> Result<Json<Profile>> {
    let profile = ProfileService::new(state.pool(), state.callers())
        .get_own(&caller)
        .await?;
    Ok(Json(profile))
}

/// PUT /api/auth/password
///
/// # Errors
///
/// Returns 401 if the current password is wrong, 422 if the new one is weak.
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode> {
    AuthService::new(state.pool())
        .change_password(user.account_id, &body.current_password, &body.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
