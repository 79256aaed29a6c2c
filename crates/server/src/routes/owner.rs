//! Store-owner dashboard.

use axum::extract::State;
use serde::Serialize;

use super::Json;
use crate::error::Result;
use crate::middleware::RequireCaller;
use crate::models::{RatingWithRater, StoreRatingSummary};
use crate::services::{RatingService, StoreService};
use crate::state::AppState;

/// The owner's store with the ratings it received.
#[derive(Debug, Serialize)]
pub struct OwnerDashboard {
    pub store: StoreRatingSummary,
    pub ratings: Vec<RatingWithRater>,
}

/// GET /api/owner/store
///
/// # Errors
///
/// Returns 404 if the caller owns no store.
pub async fn store(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
) -> Result<Json<OwnerDashboard>> {
    let store = StoreService::new(state.pool())
        .get_own_with_summary(&caller)
        .await?;
    let ratings = RatingService::new(state.pool())
        .list_for_store(Some(&caller), store.store.id)
        .await?;

    Ok(Json(OwnerDashboard { store, ratings }))
}
