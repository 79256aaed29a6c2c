//! Administrator bootstrap.
//!
//! Creating an admin through the API requires an existing admin caller; this
//! command is how the first one is made.
//!
//! # Usage
//!
//! ```bash
//! RATINGS_ADMIN_PASSWORD='S3cure!pw' \
//!     sr-cli admin create -e admin@example.com -n "Store Ratings Administrator"
//! ```
//!
//! # Environment Variables
//!
//! - `RATINGS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `RATINGS_ADMIN_PASSWORD` - Password for the new account (kept out of shell history)

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

use store_ratings_core::{Name, ProfileAddress, Role};
use store_ratings_server::services::AuthService;
use store_ratings_server::services::provisioning::ProvisionedFields;

use super::{CommandError, database_url};

/// Read the new administrator's password from the environment.
fn admin_password() -> Result<SecretString, CommandError> {
    std::env::var("RATINGS_ADMIN_PASSWORD")
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("RATINGS_ADMIN_PASSWORD"))
}

/// Create an administrator account and profile.
///
/// # Returns
///
/// The id of the created profile.
///
/// # Errors
///
/// Returns `CommandError::Invalid` for a bad name or address and
/// `CommandError::Auth` if the email is taken or the password is weak.
pub async fn create(email: &str, name: &str, address: Option<&str>) -> Result<i64, CommandError> {
    let fields = ProvisionedFields {
        name: Name::parse(name)?,
        role: Role::Admin,
        address: address.map(ProfileAddress::parse).transpose()?,
    };
    let password = admin_password()?;
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Creating administrator: {}", email);
    let (_, profile) = AuthService::new(&pool)
        .register(email, password.expose_secret(), &fields.into_metadata())
        .await?;

    tracing::info!(
        "Administrator created successfully! Profile ID: {}, Email: {}",
        profile.id,
        profile.email
    );
    Ok(profile.id.as_i64())
}
