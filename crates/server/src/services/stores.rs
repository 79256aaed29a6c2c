//! Store operations with per-row policy checks.

use sqlx::PgPool;
use tracing::instrument;

use store_ratings_core::{Caller, Operation, ProfileId, Resource, StoreId, policy};

use super::ServiceError;
use crate::db::StoreRepository;
use crate::models::{NewStore, Store, StoreFilter, StoreRatingSummary, StoreUpdate};

/// Policy-checked store operations.
pub struct StoreService<'a> {
    stores: StoreRepository<'a>,
}

impl<'a> StoreService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            stores: StoreRepository::new(pool),
        }
    }

    /// List stores with their rating summaries.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the query fails.
    #[instrument(skip(self, caller))]
    pub async fn list_with_summary(
        &self,
        caller: Option<&Caller>,
        filter: &StoreFilter,
    ) -> Result<Vec<StoreRatingSummary>, ServiceError> {
        let rows = self.stores.list_summaries(filter).await?;
        Ok(policy::retain_visible(caller, rows))
    }

    /// Get one store with its rating summary.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the store does not exist.
    #[instrument(skip(self, caller))]
    pub async fn get_with_summary(
        &self,
        caller: Option<&Caller>,
        id: StoreId,
    ) -> Result<StoreRatingSummary, ServiceError> {
        let summary = self
            .stores
            .get_summary(id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        policy::authorize(caller, Operation::Read, &summary).map_err(|_| ServiceError::NotFound)?;
        Ok(summary)
    }

    /// Get the caller's own store (their earliest-created one) with its summary.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the caller owns no store.
    #[instrument(skip(self, caller), fields(owner_id = %caller.profile_id))]
    pub async fn get_own_with_summary(
        &self,
        caller: &Caller,
    ) -> Result<StoreRatingSummary, ServiceError> {
        self.get_owned_by(Some(caller), caller.profile_id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Get the earliest-created store owned by a profile, if any.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the query fails.
    pub async fn get_owned_by(
        &self,
        caller: Option<&Caller>,
        owner_id: ProfileId,
    ) -> Result<Option<StoreRatingSummary>, ServiceError> {
        let summary = self.stores.get_summary_by_owner(owner_id).await?;
        Ok(summary.filter(|s| policy::authorize(caller, Operation::Read, s).is_ok()))
    }

    /// Create a store. Admin only.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::PermissionDenied` unless the caller is an admin.
    /// Returns `ServiceError::NotFound` if the owner profile does not exist.
    #[instrument(skip(self, caller, store), fields(owner_id = %store.owner_id))]
    pub async fn create(&self, caller: &Caller, store: &NewStore) -> Result<Store, ServiceError> {
        let proposed = Resource::Store {
            owner_id: store.owner_id,
        };
        policy::authorize(Some(caller), Operation::Create, &proposed)?;

        let created = self.stores.create(store).await?;
        tracing::info!(store_id = %created.id, "Store created");
        Ok(created)
    }

    /// Update a store. Owners may edit their store; only admins may change
    /// its owner.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the store does not exist.
    /// Returns `ServiceError::PermissionDenied` if the policy refuses the change.
    #[instrument(skip(self, caller, update))]
    pub async fn update(
        &self,
        caller: &Caller,
        id: StoreId,
        update: &StoreUpdate,
    ) -> Result<Store, ServiceError> {
        let current = self
            .stores
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        policy::authorize(Some(caller), Operation::Update, &current)?;

        if update.owner_id.is_some_and(|owner| owner != current.owner_id) {
            policy::authorize(Some(caller), Operation::Reassign, &current)?;
        }
        if update.is_empty() {
            return Ok(current);
        }

        Ok(self.stores.update(id, update).await?)
    }

    /// Delete a store and its ratings. Admin only.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the store does not exist.
    /// Returns `ServiceError::PermissionDenied` unless the caller is an admin.
    #[instrument(skip(self, caller))]
    pub async fn delete(&self, caller: &Caller, id: StoreId) -> Result<(), ServiceError> {
        let current = self
            .stores
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        policy::authorize(Some(caller), Operation::Delete, &current)?;

        if !self.stores.delete(id).await? {
            return Err(ServiceError::NotFound);
        }
        tracing::info!("Store deleted");
        Ok(())
    }
}
