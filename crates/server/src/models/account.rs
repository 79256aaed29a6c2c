//! Authentication account.

use chrono::{DateTime, Utc};
use serde::Serialize;

use store_ratings_core::{AccountId, Email};

/// A registered login. The password hash never leaves the repository.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub email: Email,
    pub created_at: DateTime<Utc>,
}
