//! User profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use store_ratings_core::{
    AccountId, Email, Name, ProfileAddress, ProfileId, Resource, Role, RowPolicy,
};

use super::SortOrder;

/// Application-level user record, one per account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: ProfileId,
    pub account_id: AccountId,
    pub name: Name,
    pub email: Email,
    pub address: Option<ProfileAddress>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RowPolicy for Profile {
    fn resource(&self) -> Resource {
        Resource::Profile {
            account_id: self.account_id,
        }
    }
}

/// Partial profile update. Absent fields are left unchanged.
///
/// `address: Some(None)` clears the address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<Name>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<ProfileAddress>>,
    pub role: Option<Role>,
}

impl ProfileUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.address.is_none() && self.role.is_none()
    }
}

/// Distinguish a missing field from an explicit `null`.
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Column a profile listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSort {
    #[default]
    Name,
    Email,
    Address,
    Role,
    CreatedAt,
}

impl ProfileSort {
    /// Whitelisted column expression for `ORDER BY`.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Address => "address",
            Self::Role => "role",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Admin profile listing filter. Text filters are case-insensitive substrings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProfileFilter {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub role: Option<Role>,
    pub sort: ProfileSort,
    pub order: SortOrder,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_update_distinguishes_null_from_missing() {
        let missing: ProfileUpdate = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.address, None);
        assert!(missing.is_empty());

        let cleared: ProfileUpdate = serde_json::from_str(r#"{"address": null}"#).unwrap();
        assert_eq!(cleared.address, Some(None));

        let set: ProfileUpdate =
            serde_json::from_str(r#"{"address": "12 Harbour Road", "role": "store_owner"}"#)
                .unwrap();
        assert_eq!(set.address.unwrap().unwrap().as_str(), "12 Harbour Road");
        assert_eq!(set.role, Some(Role::StoreOwner));
    }

    #[test]
    fn test_update_validates_name() {
        assert!(serde_json::from_str::<ProfileUpdate>(r#"{"name": "Too short"}"#).is_err());
    }

    #[test]
    fn test_filter_defaults() {
        let filter: ProfileFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(filter.sort, ProfileSort::Name);
        assert_eq!(filter.order, SortOrder::Asc);
        assert_eq!(filter.role, None);
    }
}
