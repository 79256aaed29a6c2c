//! Normal-user dashboard: every store with the caller's own score.

use std::collections::HashMap;

use axum::extract::{Query, State};
use serde::Serialize;

use store_ratings_core::Score;

use super::Json;
use crate::error::Result;
use crate::middleware::RequireCaller;
use crate::models::{Rating, StoreFilter, StoreRatingSummary};
use crate::services::{RatingService, StoreService};
use crate::state::AppState;

/// A store listing entry with the caller's score, if they rated it.
#[derive(Debug, Serialize)]
pub struct StoreCard {
    #[serde(flatten)]
    pub summary: StoreRatingSummary,
    pub my_rating: Option<Score>,
}

/// Attach the caller's scores to the store listing.
fn cards(stores: Vec<StoreRatingSummary>, own: &[Rating]) -> Vec<StoreCard> {
    let scores: HashMap<_, _> = own.iter().map(|r| (r.store_id, r.score)).collect();
    stores
        .into_iter()
        .map(|summary| StoreCard {
            my_rating: scores.get(&summary.store.id).copied(),
            summary,
        })
        .collect()
}

/// GET /api/dashboard
///
/// The store listing and the caller's ratings load concurrently.
///
/// # Errors
///
/// Returns 401 when not logged in.
pub async fn index(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Query(filter): Query<StoreFilter>,
) -> Result<Json<Vec<StoreCard>>> {
    let stores = StoreService::new(state.pool());
    let ratings = RatingService::new(state.pool());

    let (summaries, own) = tokio::try_join!(
        stores.list_with_summary(Some(&caller), &filter),
        ratings.list_own(&caller),
    )?;

    Ok(Json(cards(summaries, &own)))
}
