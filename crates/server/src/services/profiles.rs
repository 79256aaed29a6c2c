//! Profile operations with per-row policy checks.

use sqlx::PgPool;
use tracing::instrument;

use store_ratings_core::{Caller, Operation, ProfileId, Resource, policy};

use super::{CallerCache, ServiceError};
use crate::db::{ProfileRepository, StatsRepository, accounts, profiles};
use crate::models::{Profile, ProfileFilter, ProfileUpdate, Stats};

/// Policy-checked profile operations.
pub struct ProfileService<'a> {
    pool: &'a PgPool,
    profiles: ProfileRepository<'a>,
    callers: &'a CallerCache,
}

impl<'a> ProfileService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, callers: &'a CallerCache) -> Self {
        Self {
            pool,
            profiles: ProfileRepository::new(pool),
            callers,
        }
    }

    /// Get the caller's own profile.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the profile no longer exists.
    #[instrument(skip(self, caller), fields(profile_id = %caller.profile_id))]
    pub async fn get_own(&self, caller: &Caller) -> Result<Profile, ServiceError> {
        self.get(caller, caller.profile_id).await
    }

    /// Get a profile. Callers other than admins only see their own.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the profile does not exist or is
    /// not visible to the caller.
    #[instrument(skip(self, caller))]
    pub async fn get(&self, caller: &Caller, id: ProfileId) -> Result<Profile, ServiceError> {
        let profile = self
            .profiles
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        policy::authorize(Some(caller), Operation::Read, &profile)
            .map_err(|_| ServiceError::NotFound)?;
        Ok(profile)
    }

    /// List profiles matching a filter, restricted to those the caller may read.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the query fails.
    #[instrument(skip(self, caller))]
    pub async fn list(
        &self,
        caller: &Caller,
        filter: &ProfileFilter,
    ) -> Result<Vec<Profile>, ServiceError> {
        let rows = self.profiles.list(filter).await?;
        Ok(policy::retain_visible(Some(caller), rows))
    }

    /// Update a profile. Changing the role requires admin rights.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the profile does not exist.
    /// Returns `ServiceError::PermissionDenied` if the policy refuses the change.
    #[instrument(skip(self, caller, update))]
    pub async fn update(
        &self,
        caller: &Caller,
        id: ProfileId,
        update: &ProfileUpdate,
    ) -> Result<Profile, ServiceError> {
        let current = self.load(id).await?;
        policy::authorize(Some(caller), Operation::Update, &current)?;

        if update.role.is_some_and(|role| role != current.role) {
            policy::authorize(Some(caller), Operation::Reassign, &current)?;
        }
        if update.is_empty() {
            return Ok(current);
        }

        let updated = self.profiles.update(id, update).await?;
        self.callers.invalidate(updated.account_id).await;
        Ok(updated)
    }

    /// Delete a profile together with its account. Stores it owns and
    /// ratings it wrote cascade. Admin only.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the profile does not exist.
    /// Returns `ServiceError::PermissionDenied` unless the caller is an admin.
    #[instrument(skip(self, caller))]
    pub async fn delete(&self, caller: &Caller, id: ProfileId) -> Result<(), ServiceError> {
        let current = self.load(id).await?;
        policy::authorize(Some(caller), Operation::Delete, &current)?;

        let mut tx = self.pool.begin().await?;
        let account_id = profiles::lock_account_id(&mut *tx, id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        accounts::delete(&mut *tx, account_id).await?;
        tx.commit().await?;

        self.callers.invalidate(account_id).await;
        tracing::info!(%account_id, "Profile deleted");
        Ok(())
    }

    /// Fetch a row for a write; the write's own policy decides access.
    async fn load(&self, id: ProfileId) -> Result<Profile, ServiceError> {
        self.profiles
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Row counts for the admin dashboard.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::PermissionDenied` unless the caller is an admin.
    #[instrument(skip(self, caller))]
    pub async fn stats(&self, caller: &Caller) -> Result<Stats, ServiceError> {
        policy::authorize(Some(caller), Operation::Read, &Resource::Statistics)?;
        Ok(StatsRepository::new(self.pool).counts().await?)
    }
}
