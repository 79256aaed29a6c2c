//! Business logic services for Store Ratings.
//!
//! # Services
//!
//! - `access` - Caller resolution (role lookup + cache)
//! - `auth` - Registration, login, password changes, admin-created accounts
//! - `provisioning` - Profile creation for new accounts
//! - `profiles` - Profile reads, updates, deletes and statistics
//! - `stores` - Store listing with rating summaries, store management
//! - `ratings` - Rating submission and listing
//!
//! Every entry point here evaluates the row policies from
//! [`store_ratings_core::policy`] before it reads or writes.

pub mod access;
pub mod auth;
pub mod error;
pub mod profiles;
pub mod provisioning;
pub mod ratings;
pub mod stores;

pub use access::CallerCache;
pub use auth::{AuthError, AuthService, NewUserAccount};
pub use error::ServiceError;
pub use profiles::ProfileService;
pub use ratings::RatingService;
pub use stores::StoreService;
