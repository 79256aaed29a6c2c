//! Ratings.

use chrono::{DateTime, Utc};
use serde::Serialize;

use store_ratings_core::{Email, Name, ProfileId, RatingId, Resource, RowPolicy, Score, StoreId};

/// One user's score for one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rating {
    pub id: RatingId,
    pub rater_id: ProfileId,
    pub store_id: StoreId,
    pub score: Score,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RowPolicy for Rating {
    fn resource(&self) -> Resource {
        Resource::Rating {
            rater_id: self.rater_id,
        }
    }
}

/// A rating joined with the rater's display name and email.
///
/// The contact fields are `None` when the caller may not see who rated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingWithRater {
    #[serde(flatten)]
    pub rating: Rating,
    pub rater_name: Option<Name>,
    pub rater_email: Option<Email>,
}

impl RatingWithRater {
    /// The rater's contact details, scoped to the store that was rated.
    #[must_use]
    pub const fn contact(&self, owner_id: ProfileId) -> Resource {
        Resource::RaterContact {
            rater_id: self.rating.rater_id,
            owner_id,
        }
    }

    pub fn redact(&mut self) {
        self.rater_name = None;
        self.rater_email = None;
    }
}

impl RowPolicy for RatingWithRater {
    fn resource(&self) -> Resource {
        self.rating.resource()
    }
}
