//! Store and rating route handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use store_ratings_core::{Score, StoreId};

use super::Json;
use crate::error::Result;
use crate::middleware::{OptionalCaller, RequireCaller};
use crate::models::{Rating, RatingWithRater, Store, StoreFilter, StoreRatingSummary, StoreUpdate};
use crate::services::{RatingService, StoreService};
use crate::state::AppState;

/// Rating submission body.
#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub score: Score,
}

/// GET /api/stores
///
/// # Errors
///
/// Returns 503 if the database is unavailable.
pub async fn index(
    State(state): State<AppState>,
    OptionalCaller(caller): OptionalCaller,
    Query(filter): Query<StoreFilter>,
) -> Result<Json<Vec<StoreRatingSummary>>> {
    let stores = StoreService::new(state.pool())
        .list_with_summary(caller.as_ref(), &filter)
        .await?;
    Ok(Json(stores))
}

/// GET /api/stores/{id}
///
/// # Errors
///
/// Returns 404 if the store does not exist.
pub async fn show(
    State(state): State<AppState>,
    OptionalCaller(caller): OptionalCaller,
    Path(id): Path<StoreId>,
) -> Result<Json<StoreRatingSummary>> {
    let store = StoreService::new(state.pool())
        .get_with_summary(caller.as_ref(), id)
        .await?;
    Ok(Json(store))
}

/// PATCH /api/stores/{id}
///
/// # Errors
///
/// Returns 403 unless the caller owns the store or is an admin.
pub async fn update(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(id): Path<StoreId>,
    Json(body): Json<StoreUpdate>,
) -> Result<Json<Store>> {
    let store = StoreService::new(state.pool())
        .update(&caller, id, &body)
        .await?;
    Ok(Json(store))
}

/// DELETE /api/stores/{id}
///
/// # Errors
///
/// Returns 403 unless the caller is an admin.
pub async fn destroy(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(id): Path<StoreId>,
) -> Result<StatusCode> {
    StoreService::new(state.pool()).delete(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/stores/{id}/ratings
///
/// # Errors
///
/// Returns 404 if the store does not exist.
pub async fn ratings(
    State(state): State<AppState>,
    OptionalCaller(caller): OptionalCaller,
    Path(id): Path<StoreId>,
) -> Result<Json<Vec<RatingWithRater>>> {
    let ratings = RatingService::new(state.pool())
        .list_for_store(caller.as_ref(), id)
        .await?;
    Ok(Json(ratings))
}

/// PUT /api/stores/{id}/rating
///
/// # Errors
///
/// Returns 422 for a score outside 1-5, 404 if the store does not exist.
pub async fn rate(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(id): Path<StoreId>,
    Json(body): Json<RateRequest>,
) -> Result<Json<Rating>> {
    let rating = RatingService::new(state.pool())
        .upsert(&caller, id, body.score)
        .await?;
    Ok(Json(rating))
}

/// DELETE /api/stores/{id}/rating
///
/// # Errors
///
/// Returns 404 if the caller has not rated the store.
pub async fn remove_rating(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(id): Path<StoreId>,
) -> Result<StatusCode> {
    RatingService::new(state.pool())
        .delete_own(&caller, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_request_rejects_out_of_range_and_fractions() {
        for body in [r#"{"score": 0}"#, r#"{"score": 6}"#, r#"{"score": 4.5}"#] {
            assert!(serde_json::from_str::<RateRequest>(body).is_err(), "{body}");
        }
        assert!(serde_json::from_str::<RateRequest>(r#"{"score": 5}"#).is_ok());
    }
}
