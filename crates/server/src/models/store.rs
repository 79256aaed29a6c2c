//! Stores and their rating summaries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use store_ratings_core::{Email, Name, ProfileId, Resource, RowPolicy, StoreAddress, StoreId};

use super::SortOrder;

/// A rated store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Store {
    pub id: StoreId,
    pub owner_id: ProfileId,
    pub name: Name,
    pub email: Email,
    pub address: StoreAddress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RowPolicy for Store {
    fn resource(&self) -> Resource {
        Resource::Store {
            owner_id: self.owner_id,
        }
    }
}

/// A store with its live rating aggregate.
///
/// `average_rating` is the mean of all scores (0 with no ratings), normalized
/// so that `4.0000000000000000` serializes as `"4"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreRatingSummary {
    #[serde(flatten)]
    pub store: Store,
    pub average_rating: Decimal,
    pub total_ratings: i64,
}

impl RowPolicy for StoreRatingSummary {
    fn resource(&self) -> Resource {
        self.store.resource()
    }
}

/// Fields for a new store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewStore {
    pub name: Name,
    pub email: Email,
    pub address: StoreAddress,
    pub owner_id: ProfileId,
}

/// Partial store update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StoreUpdate {
    pub name: Option<Name>,
    pub email: Option<Email>,
    pub address: Option<StoreAddress>,
    pub owner_id: Option<ProfileId>,
}

impl StoreUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.address.is_none()
            && self.owner_id.is_none()
    }
}

/// Column a store listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreSort {
    #[default]
    Name,
    Email,
    Address,
    AverageRating,
    CreatedAt,
}

impl StoreSort {
    /// Whitelisted column expression for `ORDER BY`.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Address => "address",
            Self::AverageRating => "average_rating",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Store listing filter. Text filters are case-insensitive substrings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreFilter {
    pub name: Option<String>,
    pub address: Option<String>,
    pub sort: StoreSort,
    pub order: SortOrder,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store() -> Store {
        Store {
            id: StoreId::new(1),
            owner_id: ProfileId::new(7),
            name: Name::parse("Harbourside Books and Maps").unwrap(),
            email: Email::parse("books@harbourside.example").unwrap(),
            address: StoreAddress::parse("1 Quay Street").unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_serializes_flat() {
        let summary = StoreRatingSummary {
            store: store(),
            average_rating: Decimal::new(40, 1).normalize(),
            total_ratings: 3,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["name"], "Harbourside Books and Maps");
        assert_eq!(json["owner_id"], 7);
        assert_eq!(json["average_rating"], "4");
        assert_eq!(json["total_ratings"], 3);
    }

    #[test]
    fn test_summary_policy_is_store_policy() {
        let summary = StoreRatingSummary {
            store: store(),
            average_rating: Decimal::ZERO,
            total_ratings: 0,
        };
        assert_eq!(
            summary.resource(),
            Resource::Store {
                owner_id: ProfileId::new(7)
            }
        );
    }

    #[test]
    fn test_filter_parses_sort() {
        let filter: StoreFilter =
            serde_json::from_str(r#"{"name": "books", "sort": "average_rating", "order": "desc"}"#)
                .unwrap();
        assert_eq!(filter.sort.column(), "average_rating");
        assert_eq!(filter.order, SortOrder::Desc);
        assert!(serde_json::from_str::<StoreFilter>(r#"{"sort": "owner_id; DROP"}"#).is_err());
    }
}
