//! Domain models for Store Ratings.
//!
//! Each row type implements [`RowPolicy`](store_ratings_core::RowPolicy) so
//! services can check it against the access-control table.

pub mod account;
pub mod profile;
pub mod rating;
pub mod session;
pub mod sort;
pub mod store;

pub use account::Account;
pub use profile::{Profile, ProfileFilter, ProfileSort, ProfileUpdate};
pub use rating::{Rating, RatingWithRater};
pub use session::{CurrentUser, keys as session_keys};
pub use sort::SortOrder;
pub use store::{NewStore, Store, StoreFilter, StoreRatingSummary, StoreSort, StoreUpdate};

use serde::Serialize;

/// Row counts shown on the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total_profiles: i64,
    pub total_stores: i64,
    pub total_ratings: i64,
}
