//! Administrator route handlers.
//!
//! Every handler here goes through the same policy-checked services as the
//! rest of the API; a non-admin caller gets 403 on writes and statistics and
//! sees only their own profile in listings.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use store_ratings_core::{Email, Name, ProfileAddress, ProfileId, Role};

use super::Json;
use crate::error::Result;
use crate::middleware::RequireCaller;
use crate::models::{
    NewStore, Profile, ProfileFilter, ProfileUpdate, Stats, Store, StoreRatingSummary,
};
use crate::services::{AuthService, NewUserAccount, ProfileService, StoreService};
use crate::state::AppState;

/// Body for creating an account with an explicit role.
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: Name,
    pub email: Email,
    #[serde(default)]
    pub address: Option<ProfileAddress>,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

impl From<CreateUserRequest> for NewUserAccount {
    fn from(body: CreateUserRequest) -> Self {
        Self {
            name: body.name,
            email: body.email,
            address: body.address,
            password: body.password,
            role: body.role,
        }
    }
}

/// A profile with the store it owns, if any.
#[derive(Debug, Serialize)]
pub struct ProfileDetail {
    #[serde(flatten)]
    pub profile: Profile,
    pub store: Option<StoreRatingSummary>,
}

/// GET /api/admin/stats
///
/// # Errors
///
/// Returns 403 unless the caller is an admin.
pub async fn stats(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
) -> Result<Json<Stats>> {
    let stats = ProfileService::new(state.pool(), state.callers())
        .stats(&caller)
        .await?;
    Ok(Json(stats))
}

/// GET /api/admin/profiles
///
/// # Errors
///
/// Returns 503 if the database is unavailable.
pub async fn profiles(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Query(filter): Query<ProfileFilter>,
) -> Result<Json<Vec<Profile>>> {
    let profiles = ProfileService::new(state.pool(), state.callers())
        .list(&caller, &filter)
        .await?;
    Ok(Json(profiles))
}

/// GET /api/admin/profiles/{id}
///
/// # Errors
///
/// Returns 404 if the profile does not exist or is not visible.
pub async fn profile(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(id): Path<ProfileId>,
) -> Result<Json<ProfileDetail>> {
    let profile = ProfileService::new(state.pool(), state.callers())
        .get(&caller, id)
        .await?;
    let store = StoreService::new(state.pool())
        .get_owned_by(Some(&caller), id)
        .await?;
    Ok(Json(ProfileDetail { profile, store }))
}

/// PATCH /api/admin/profiles/{id}
///
/// # Errors
///
/// Returns 403 if the role change is refused, 422 for invalid fields.
pub async fn update_profile(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(id): Path<ProfileId>,
    Json(body): Json<ProfileUpdate>,
) -> Result<Json<Profile>> {
    let profile = ProfileService::new(state.pool(), state.callers())
        .update(&caller, id, &body)
        .await?;
    Ok(Json(profile))
}

/// DELETE /api/admin/profiles/{id}
///
/// # Errors
///
/// Returns 403 unless the caller is an admin.
pub async fn delete_profile(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(id): Path<ProfileId>,
) -> Result<StatusCode> {
    ProfileService::new(state.pool(), state.callers())
        .delete(&caller, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/admin/users
///
/// # Errors
///
/// Returns 403 unless the caller is an admin, 409 if the email is taken.
pub async fn create_user(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Profile>)> {
    let profile = AuthService::new(state.pool())
        .create_user_account(&caller, body.into())
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// POST /api/admin/stores
///
/// # Errors
///
/// Returns 403 unless the caller is an admin, 404 if the owner does not exist.
pub async fn create_store(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Json(body): Json<NewStore>,
) -> Result<(StatusCode, Json<Store>)> {
    let store = StoreService::new(state.pool())
        .create(&caller, &body)
        .await?;
    Ok((StatusCode::CREATED, Json(store)))
}
