//! Rating operations with per-row policy checks.
//!
//! Submitting a score is an upsert: insert first, and if the (rater, store)
//! unique constraint fires, update the row that won. A concurrent duplicate
//! submission therefore ends as an update instead of an error.

use sqlx::PgPool;
use tracing::instrument;

use store_ratings_core::{Caller, Operation, Resource, Score, StoreId, policy};

use super::ServiceError;
use crate::db::{RatingRepository, StoreRepository, ratings::RATER_STORE_UNIQUE};
use crate::models::{Rating, RatingWithRater};

/// Policy-checked rating operations.
pub struct RatingService<'a> {
    ratings: RatingRepository<'a>,
    stores: StoreRepository<'a>,
}

impl<'a> RatingService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            ratings: RatingRepository::new(pool),
            stores: StoreRepository::new(pool),
        }
    }

    /// Create or replace the caller's rating for a store.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the store does not exist.
    /// Returns `ServiceError::PermissionDenied` if the policy refuses the write.
    #[instrument(skip(self, caller), fields(rater_id = %caller.profile_id))]
    pub async fn upsert(
        &self,
        caller: &Caller,
        store_id: StoreId,
        score: Score,
    ) -> Result<Rating, ServiceError> {
        let proposed = Resource::Rating {
            rater_id: caller.profile_id,
        };
        policy::authorize(Some(caller), Operation::Create, &proposed)?;

        match self.ratings.insert(caller.profile_id, store_id, score).await {
            Ok(rating) => {
                tracing::info!(rating_id = %rating.id, "Rating created");
                Ok(rating)
            }
            Err(err) if err.is_conflict_on(RATER_STORE_UNIQUE) => {
                // Deleted between the failed insert and this read: nothing to update.
                let existing = self
                    .ratings
                    .get_by_pair(caller.profile_id, store_id)
                    .await?
                    .ok_or(ServiceError::NotFound)?;
                policy::authorize(Some(caller), Operation::Update, &existing)?;

                let updated = self.ratings.update_score(existing.id, score).await?;
                tracing::info!(rating_id = %updated.id, "Rating updated");
                Ok(updated)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Create a rating, failing if the caller already rated the store.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` with `DuplicateRating` if a rating
    /// for the pair exists.
    /// Returns `ServiceError::NotFound` if the store does not exist.
    #[instrument(skip(self, caller), fields(rater_id = %caller.profile_id))]
    pub async fn create(
        &self,
        caller: &Caller,
        store_id: StoreId,
        score: Score,
    ) -> Result<Rating, ServiceError> {
        let proposed = Resource::Rating {
            rater_id: caller.profile_id,
        };
        policy::authorize(Some(caller), Operation::Create, &proposed)?;

        Ok(self.ratings.insert(caller.profile_id, store_id, score).await?)
    }

    /// Delete the caller's rating for a store.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the caller has not rated the store.
    #[instrument(skip(self, caller), fields(rater_id = %caller.profile_id))]
    pub async fn delete_own(&self, caller: &Caller, store_id: StoreId) -> Result<(), ServiceError> {
        let existing = self
            .ratings
            .get_by_pair(caller.profile_id, store_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        policy::authorize(Some(caller), Operation::Delete, &existing)?;

        if !self.ratings.delete(existing.id).await? {
            return Err(ServiceError::NotFound);
        }
        tracing::info!(rating_id = %existing.id, "Rating deleted");
        Ok(())
    }

    /// List a store's ratings with rater name and email.
    ///
    /// Contact details are cleared on rows where `RaterContact` reads are
    /// denied to the caller.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the store does not exist.
    #[instrument(skip(self, caller))]
    pub async fn list_for_store(
        &self,
        caller: Option<&Caller>,
        store_id: StoreId,
    ) -> Result<Vec<RatingWithRater>, ServiceError> {
        let store = self
            .stores
            .get_by_id(store_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        policy::authorize(caller, Operation::Read, &store).map_err(|_| ServiceError::NotFound)?;

        let rows = self.ratings.list_for_store(store_id).await?;
        let mut rows = policy::retain_visible(caller, rows);
        for row in &mut rows {
            let contact = row.contact(store.owner_id);
            if !policy::evaluate(caller, Operation::Read, &contact).is_allowed() {
                row.redact();
            }
        }
        Ok(rows)
    }

    /// List the ratings the caller has given.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the query fails.
    #[instrument(skip(self, caller), fields(rater_id = %caller.profile_id))]
    pub async fn list_own(&self, caller: &Caller) -> Result<Vec<Rating>, ServiceError> {
        let rows = self.ratings.list_for_rater(caller.profile_id).await?;
        Ok(policy::retain_visible(Some(caller), rows))
    }
}
