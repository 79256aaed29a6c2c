//! Own-profile route handlers.

use axum::extract::State;
use serde::Deserialize;

use store_ratings_core::{Name, ProfileAddress};

use super::Json;
use crate::error::Result;
use crate::middleware::RequireCaller;
use crate::models::profile::double_option;
use crate::models::{Profile, ProfileUpdate};
use crate::services::ProfileService;
use crate::state::AppState;

/// Fields a user may change on their own profile. The role is not one of them.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OwnProfileUpdate {
    pub name: Option<Name>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<ProfileAddress>>,
}

impl From<OwnProfileUpdate> for ProfileUpdate {
    fn from(update: OwnProfileUpdate) -> Self {
        Self {
            name: update.name,
            address: update.address,
            role: None,
        }
    }
}

/// GET /api/profile
///
/// # Errors
///
/// Returns 401 when not logged in.
pub async fn show(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
) -> Result<Json<Profile>> {
    let profile = ProfileService::new(state.pool(), state.callers())
        .get_own(&caller)
        .await?;
    Ok(Json(profile))
}

/// PATCH /api/profile
///
/// # Errors
///
/// Returns 422 for invalid fields, 400 for unknown ones such as `role`.
pub async fn update(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Json(body): Json<OwnProfileUpdate>,
) -> Result<Json<Profile>> {
    let profile = ProfileService::new(state.pool(), state.callers())
        .update(&caller, caller.profile_id, &body.into())
        .await?;
    Ok(Json(profile))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_is_not_accepted() {
        let body = r#"{"role": "admin"}"#;
        assert!(serde_json::from_str::<OwnProfileUpdate>(body).is_err());
    }

    #[test]
    fn test_null_address_clears() {
        let update: ProfileUpdate = serde_json::from_str::<OwnProfileUpdate>(r#"{"address": null}"#)
            .unwrap()
            .into();
        assert_eq!(update.address, Some(None));
        assert!(update.role.is_none());
    }
}
