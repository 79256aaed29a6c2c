//! Caller resolution.
//!
//! A session only carries the account id. The caller's profile id and role
//! come from a direct single-row read of their own profile, memoized for a
//! short time. The lookup goes to the repository, never through the policy
//! layer, so resolving a caller cannot recurse into policy evaluation.

use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use store_ratings_core::{AccountId, Caller};

use crate::db::{ProfileRepository, RepositoryError};

/// Upper bound on cached callers.
const MAX_CACHED_CALLERS: u64 = 10_000;

/// Per-process cache of resolved callers, keyed by account.
#[derive(Clone)]
pub struct CallerCache {
    cache: Cache<AccountId, Caller>,
}

impl CallerCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(MAX_CACHED_CALLERS)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Resolve the caller for an account.
    ///
    /// Returns `None` when the account has no profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the profile lookup fails.
    pub async fn resolve(
        &self,
        pool: &PgPool,
        account_id: AccountId,
    ) -> Result<Option<Caller>, RepositoryError> {
        if let Some(caller) = self.cache.get(&account_id).await {
            return Ok(Some(caller));
        }

        let Some(profile) = ProfileRepository::new(pool)
            .get_by_account_id(account_id)
            .await?
        else {
            return Ok(None);
        };

        let caller = Caller {
            account_id,
            profile_id: profile.id,
            role: profile.role,
        };
        self.cache.insert(account_id, caller).await;
        Ok(Some(caller))
    }

    /// Drop the cached caller after their profile changes.
    pub async fn invalidate(&self, account_id: AccountId) {
        self.cache.invalidate(&account_id).await;
    }

    #[cfg(test)]
    pub(crate) async fn insert(&self, caller: Caller) {
        self.cache.insert(caller.account_id, caller).await;
    }
}

#[cfg(test)]
mod tests {
    use store_ratings_core::{ProfileId, Role};

    use super::*;

    #[tokio::test]
    async fn test_cached_caller_is_served_without_database() {
        let cache = CallerCache::new(Duration::from_secs(30));
        let caller = Caller {
            account_id: AccountId::generate(),
            profile_id: ProfileId::new(1),
            role: Role::StoreOwner,
        };
        cache.insert(caller).await;

        // Never connects: served from the cache.
        let pool = PgPool::connect_lazy("postgres://localhost/unused").expect("lazy pool");
        let resolved = cache.resolve(&pool, caller.account_id).await.expect("cached");
        assert_eq!(resolved, Some(caller));
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry() {
        let cache = CallerCache::new(Duration::from_secs(30));
        let caller = Caller {
            account_id: AccountId::generate(),
            profile_id: ProfileId::new(2),
            role: Role::Admin,
        };
        cache.insert(caller).await;
        cache.invalidate(caller.account_id).await;
        assert!(cache.cache.get(&caller.account_id).await.is_none());
    }
}
