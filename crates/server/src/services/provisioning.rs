//! Identity provisioning.
//!
//! Runs inside the registration transaction, right after the account row is
//! inserted, and materializes that account's single profile. It is the only
//! writer of profile rows that bypasses the policy layer, and it only ever
//! writes the row keyed by the triggering account. Redelivery for the same
//! account returns the existing profile.

use serde_json::{Map, Value};
use sqlx::PgConnection;
use tracing::instrument;

use store_ratings_core::{AccountId, Email, Name, ProfileAddress, Role};

use crate::db::{RepositoryError, profiles};
use crate::models::Profile;

/// Free-form metadata supplied at registration.
///
/// Recognized keys are `name`, `role` and `address`; anything else is ignored.
pub type Metadata = Map<String, Value>;

/// Profile fields derived from registration metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedFields {
    pub name: Name,
    pub role: Role,
    pub address: Option<ProfileAddress>,
}

impl ProvisionedFields {
    /// Apply the defaults: a missing or invalid name becomes the placeholder,
    /// a missing or unknown role becomes `normal_user`, and an invalid address
    /// is dropped.
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let text = |key: &str| metadata.get(key).and_then(Value::as_str);

        Self {
            name: text("name")
                .and_then(|name| Name::parse(name).ok())
                .unwrap_or_else(Name::placeholder),
            role: Role::parse_or_default(text("role")),
            address: text("address").and_then(|address| ProfileAddress::parse(address).ok()),
        }
    }

    /// Encode typed fields as metadata for the hook.
    #[must_use]
    pub fn into_metadata(self) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("name".to_owned(), Value::String(self.name.into_inner()));
        metadata.insert("role".to_owned(), Value::String(self.role.as_str().to_owned()));
        if let Some(address) = self.address {
            metadata.insert("address".to_owned(), Value::String(address.into_inner()));
        }
        metadata
    }
}

/// Handle an account-created event.
///
/// # Errors
///
/// Returns `RepositoryError::MissingReference` if the account row is not
/// visible on `conn`.
#[instrument(skip(conn, email, metadata), fields(account_id = %account_id))]
pub async fn on_account_created(
    conn: &mut PgConnection,
    account_id: AccountId,
    email: &Email,
    metadata: &Metadata,
) -> Result<Profile, RepositoryError> {
    let fields = ProvisionedFields::from_metadata(metadata);
    create_profile(
        conn,
        account_id,
        &fields.name,
        email,
        fields.address.as_ref(),
        fields.role,
    )
    .await
}

/// Create the profile for `account_id`, or return the one that exists.
///
/// Only called from [`on_account_created`].
///
/// # Errors
///
/// Returns `RepositoryError` if the insert or the follow-up read fails.
async fn create_profile(
    conn: &mut PgConnection,
    account_id: AccountId,
    name: &Name,
    email: &Email,
    address: Option<&ProfileAddress>,
    role: Role,
) -> Result<Profile, RepositoryError> {
    if let Some(profile) =
        profiles::insert_if_absent(&mut *conn, account_id, name, email, address, role).await?
    {
        tracing::info!(profile_id = %profile.id, role = %profile.role, "Profile provisioned");
        return Ok(profile);
    }

    tracing::debug!("Profile already provisioned");
    profiles::get_by_account_id(conn, account_id)
        .await?
        .ok_or(RepositoryError::NotFound)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn metadata(value: Value) -> Metadata {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_empty_metadata_uses_defaults() {
        let fields = ProvisionedFields::from_metadata(&Metadata::new());
        assert_eq!(fields.name.as_str(), "Unnamed Store Ratings User");
        assert_eq!(fields.role, Role::NormalUser);
        assert_eq!(fields.address, None);
    }

    #[test]
    fn test_valid_metadata_is_used() {
        let fields = ProvisionedFields::from_metadata(&metadata(json!({
            "name": "Margaret Okonkwo-Lindqvist",
            "role": "store_owner",
            "address": "4 Mill Lane",
        })));
        assert_eq!(fields.name.as_str(), "Margaret Okonkwo-Lindqvist");
        assert_eq!(fields.role, Role::StoreOwner);
        assert_eq!(fields.address.unwrap().as_str(), "4 Mill Lane");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let fields = ProvisionedFields::from_metadata(&metadata(json!({
            "name": "Al",
            "role": "superuser",
            "address": "x".repeat(401),
        })));
        assert_eq!(fields.name, Name::placeholder());
        assert_eq!(fields.role, Role::NormalUser);
        assert_eq!(fields.address, None);
    }

    #[test]
    fn test_non_string_values_are_ignored() {
        let fields = ProvisionedFields::from_metadata(&metadata(json!({
            "name": 42,
            "role": ["admin"],
        })));
        assert_eq!(fields.name, Name::placeholder());
        assert_eq!(fields.role, Role::NormalUser);
    }

    #[test]
    fn test_metadata_roundtrip() {
        let fields = ProvisionedFields {
            name: Name::parse("Margaret Okonkwo-Lindqvist").unwrap(),
            role: Role::Admin,
            address: None,
        };
        assert_eq!(
            ProvisionedFields::from_metadata(&fields.clone().into_metadata()),
            fields
        );
    }
}
