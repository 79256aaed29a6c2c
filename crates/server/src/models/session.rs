//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use store_ratings_core::{AccountId, Email};

/// Session-stored account identity.
///
/// The role is not stored here; it is resolved per request from the
/// caller's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Account ID.
    pub account_id: AccountId,
    /// Account email address.
    pub email: Email,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in account.
    pub const CURRENT_USER: &str = "current_user";
}
