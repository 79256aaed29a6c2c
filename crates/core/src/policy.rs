//! Per-row access-control policies.
//!
//! Every data-access entry point evaluates the caller against the row it is
//! about to read or write. Rows describe themselves through [`RowPolicy`];
//! the decision is a pure function of `(caller, operation, resource)`.
//!
//! | Resource   | Read          | Create | Update          | Delete | Reassign |
//! |------------|---------------|--------|-----------------|--------|----------|
//! | Profile    | own or admin  | admin  | own or admin    | admin  | admin    |
//! | Store      | anyone        | admin  | owner or admin  | admin  | admin    |
//! | Rating     | anyone        | rater  | rater           | rater  | never    |
//! | RaterContact | rater, store owner or admin | never | never | never | never |
//! | Statistics | admin         | never  | never           | never  | never    |
//!
//! "Reassign" covers changing a profile's role or a store's owner.
//! `RaterContact` is the rater's name and email as shown next to a rating.
//!
//! The [`Caller`] carries the role resolved by a direct lookup of the caller's
//! own profile row; evaluating a policy never consults another policy.

use serde::{Deserialize, Serialize};

use crate::types::{AccountId, ProfileId, Role};

/// The authenticated principal a request runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub account_id: AccountId,
    pub profile_id: ProfileId,
    pub role: Role,
}

impl Caller {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Operation being attempted on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
    /// Change a profile's role or a store's owner.
    Reassign,
}

/// The policy-relevant projection of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Profile { account_id: AccountId },
    Store { owner_id: ProfileId },
    Rating { rater_id: ProfileId },
    /// Who left a rating, as seen on the rated store.
    RaterContact {
        rater_id: ProfileId,
        owner_id: ProfileId,
    },
    Statistics,
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    const fn from_bool(allowed: bool) -> Self {
        if allowed { Self::Allow } else { Self::Deny }
    }

    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// A write was refused by policy.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("permission denied: cannot {operation:?} {resource:?}")]
pub struct PolicyDenied {
    pub operation: Operation,
    pub resource: Resource,
}

/// Rows that can be checked against the policy table.
pub trait RowPolicy {
    fn resource(&self) -> Resource;
}

impl RowPolicy for Resource {
    fn resource(&self) -> Resource {
        *self
    }
}

/// Evaluate the policy for one row.
///
/// `caller` is `None` for anonymous requests, which may only read public rows.
#[must_use]
pub fn evaluate(caller: Option<&Caller>, operation: Operation, resource: &Resource) -> Decision {
    let public_read = matches!(resource, Resource::Store { .. } | Resource::Rating { .. });
    if operation == Operation::Read && public_read {
        return Decision::Allow;
    }

    let Some(caller) = caller else {
        return Decision::Deny;
    };
    let admin = caller.is_admin();

    let allowed = match (*resource, operation) {
        (Resource::Profile { account_id }, Operation::Read | Operation::Update) => {
            admin || caller.account_id == account_id
        }
        (
            Resource::Profile { .. } | Resource::Store { .. },
            Operation::Create | Operation::Delete | Operation::Reassign,
        )
        | (Resource::Statistics, Operation::Read) => admin,
        (Resource::Store { owner_id }, Operation::Update) => {
            admin || caller.profile_id == owner_id
        }
        (Resource::Rating { rater_id }, Operation::Create | Operation::Update | Operation::Delete) => {
            caller.profile_id == rater_id
        }
        (Resource::RaterContact { rater_id, owner_id }, Operation::Read) => {
            admin || caller.profile_id == rater_id || caller.profile_id == owner_id
        }
        // Public reads were admitted above.
        (Resource::Store { .. } | Resource::Rating { .. }, Operation::Read)
        | (Resource::Rating { .. }, Operation::Reassign)
        | (Resource::RaterContact { .. } | Resource::Statistics, _) => false,
    };

    Decision::from_bool(allowed)
}

/// Check a write (or single-row read) against the policy.
///
/// # Errors
///
/// Returns [`PolicyDenied`] when the policy does not admit the operation.
pub fn authorize<R: RowPolicy + ?Sized>(
    caller: Option<&Caller>,
    operation: Operation,
    row: &R,
) -> Result<(), PolicyDenied> {
    let resource = row.resource();
    if evaluate(caller, operation, &resource).is_allowed() {
        Ok(())
    } else {
        Err(PolicyDenied {
            operation,
            resource,
        })
    }
}

/// Drop the rows the caller may not read.
///
/// Hidden rows are indistinguishable from rows that do not exist.
#[must_use]
pub fn retain_visible<R: RowPolicy>(caller: Option<&Caller>, mut rows: Vec<R>) -> Vec<R> {
    rows.retain(|row| evaluate(caller, Operation::Read, &row.resource()).is_allowed());
    rows
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn caller(profile: i64, role: Role) -> Caller {
        Caller {
            account_id: AccountId::generate(),
            profile_id: ProfileId::new(profile),
            role,
        }
    }

    fn profile_of(caller: &Caller) -> Resource {
        Resource::Profile {
            account_id: caller.account_id,
        }
    }

    fn allowed(caller: Option<&Caller>, op: Operation, resource: Resource) -> bool {
        evaluate(caller, op, &resource).is_allowed()
    }

    #[test]
    fn test_profile_read_own_or_admin() {
        let alice = caller(1, Role::NormalUser);
        let bob = caller(2, Role::NormalUser);
        let admin = caller(3, Role::Admin);

        assert!(allowed(Some(&alice), Operation::Read, profile_of(&alice)));
        assert!(!allowed(Some(&alice), Operation::Read, profile_of(&bob)));
        assert!(allowed(Some(&admin), Operation::Read, profile_of(&bob)));
        assert!(!allowed(None, Operation::Read, profile_of(&bob)));
    }

    #[test]
    fn test_normal_user_cannot_update_other_profile() {
        let alice = caller(1, Role::NormalUser);
        let bob = caller(2, Role::NormalUser);
        let admin = caller(3, Role::Admin);

        assert!(allowed(Some(&alice), Operation::Update, profile_of(&alice)));
        assert!(!allowed(Some(&alice), Operation::Update, profile_of(&bob)));
        assert!(allowed(Some(&admin), Operation::Update, profile_of(&bob)));
    }

    #[test]
    fn test_only_admin_creates_deletes_and_reassigns_profiles() {
        let owner = caller(1, Role::StoreOwner);
        let admin = caller(2, Role::Admin);
        let target = profile_of(&owner);

        for op in [Operation::Create, Operation::Delete, Operation::Reassign] {
            assert!(!allowed(Some(&owner), op, target), "{op:?}");
            assert!(allowed(Some(&admin), op, target), "{op:?}");
        }
    }

    #[test]
    fn test_store_owner_updates_only_own_store() {
        let owner = caller(1, Role::StoreOwner);
        let other_owner = caller(2, Role::StoreOwner);
        let admin = caller(3, Role::Admin);
        let own = Resource::Store {
            owner_id: owner.profile_id,
        };
        let foreign = Resource::Store {
            owner_id: other_owner.profile_id,
        };

        assert!(allowed(Some(&owner), Operation::Update, own));
        assert!(!allowed(Some(&owner), Operation::Update, foreign));
        assert!(allowed(Some(&admin), Operation::Update, foreign));
        assert!(!allowed(Some(&owner), Operation::Create, own));
        assert!(!allowed(Some(&owner), Operation::Reassign, own));
        assert!(!allowed(Some(&owner), Operation::Delete, own));
    }

    #[test]
    fn test_stores_and_ratings_are_public() {
        let store = Resource::Store {
            owner_id: ProfileId::new(9),
        };
        let rating = Resource::Rating {
            rater_id: ProfileId::new(9),
        };
        assert!(allowed(None, Operation::Read, store));
        assert!(allowed(None, Operation::Read, rating));
        assert!(!allowed(None, Operation::Update, store));
        assert!(!allowed(None, Operation::Create, rating));
    }

    #[test]
    fn test_ratings_belong_to_rater() {
        let rater = caller(1, Role::NormalUser);
        let admin = caller(2, Role::Admin);
        let own = Resource::Rating {
            rater_id: rater.profile_id,
        };

        for op in [Operation::Create, Operation::Update, Operation::Delete] {
            assert!(allowed(Some(&rater), op, own), "{op:?}");
            // Admins do not write ratings on behalf of others.
            assert!(!allowed(Some(&admin), op, own), "{op:?}");
        }
        assert!(!allowed(Some(&rater), Operation::Reassign, own));
    }

    #[test]
    fn test_rater_contact_visible_to_rater_owner_and_admin() {
        let rater = caller(1, Role::NormalUser);
        let owner = caller(2, Role::StoreOwner);
        let stranger = caller(3, Role::NormalUser);
        let other_owner = caller(4, Role::StoreOwner);
        let admin = caller(5, Role::Admin);
        let contact = Resource::RaterContact {
            rater_id: rater.profile_id,
            owner_id: owner.profile_id,
        };

        assert!(allowed(Some(&rater), Operation::Read, contact));
        assert!(allowed(Some(&owner), Operation::Read, contact));
        assert!(allowed(Some(&admin), Operation::Read, contact));
        assert!(!allowed(Some(&stranger), Operation::Read, contact));
        assert!(!allowed(Some(&other_owner), Operation::Read, contact));
        assert!(!allowed(None, Operation::Read, contact));
        assert!(!allowed(Some(&admin), Operation::Update, contact));
    }

    #[test]
    fn test_statistics_admin_only() {
        let user = caller(1, Role::NormalUser);
        let admin = caller(2, Role::Admin);
        assert!(!allowed(Some(&user), Operation::Read, Resource::Statistics));
        assert!(allowed(Some(&admin), Operation::Read, Resource::Statistics));
        assert!(!allowed(Some(&admin), Operation::Update, Resource::Statistics));
    }

    #[test]
    fn test_authorize_reports_denial() {
        let user = caller(1, Role::NormalUser);
        let err = authorize(Some(&user), Operation::Create, &Resource::Statistics).unwrap_err();
        assert_eq!(err.operation, Operation::Create);
        assert_eq!(err.resource, Resource::Statistics);
    }

    #[test]
    fn test_retain_visible_hides_other_profiles() {
        let alice = caller(1, Role::NormalUser);
        let bob = caller(2, Role::NormalUser);
        let admin = caller(3, Role::Admin);
        let rows = vec![profile_of(&alice), profile_of(&bob)];

        assert_eq!(
            retain_visible(Some(&alice), rows.clone()),
            vec![profile_of(&alice)]
        );
        assert_eq!(retain_visible(Some(&admin), rows.clone()).len(), 2);
        assert!(retain_visible(None, rows).is_empty());
    }
}
