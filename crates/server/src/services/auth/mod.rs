//! Authentication service.
//!
//! Accounts are the authentication boundary. Registration inserts the
//! account and runs the provisioning hook in one transaction, so an account
//! never commits without its profile.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use tracing::instrument;

use store_ratings_core::{
    AccountId, Caller, Email, Name, Operation, ProfileAddress, Resource, Role, ValidationError,
    policy,
};

use super::provisioning::{self, Metadata, ProvisionedFields};
use crate::db::{AccountRepository, RepositoryError, accounts};
use crate::models::{Account, Profile};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum password length.
const MAX_PASSWORD_LENGTH: usize = 16;

/// Input for an administrator-created account.
pub struct NewUserAccount {
    pub name: Name,
    pub email: Email,
    pub address: Option<ProfileAddress>,
    pub password: String,
    pub role: Role,
}

/// Authentication service.
///
/// Handles registration, login, password changes and administrator-created
/// accounts.
pub struct AuthService<'a> {
    pool: &'a PgPool,
    accounts: AccountRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            accounts: AccountRepository::new(pool),
        }
    }

    /// Register a new account with email and password.
    ///
    /// `metadata` is handed to the provisioning hook unchanged.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the email or password is invalid.
    /// Returns `AuthError::AccountAlreadyExists` if the email is already registered.
    #[instrument(skip_all)]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        metadata: &Metadata,
    ) -> Result<(Account, Profile), AuthError> {
        let email = Email::parse(email).map_err(ValidationError::from)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let mut tx = self.pool.begin().await?;

        let account = accounts::insert(&mut *tx, AccountId::generate(), &email, &password_hash)
            .await
            .map_err(|e| match e {
                e if e.is_conflict_on(accounts::EMAIL_UNIQUE) => AuthError::AccountAlreadyExists,
                other => AuthError::Repository(other),
            })?;
        let profile =
            provisioning::on_account_created(&mut *tx, account.id, &account.email, metadata).await?;

        tx.commit().await?;

        tracing::info!(account_id = %account.id, profile_id = %profile.id, "Account registered");
        Ok((account, profile))
    }

    /// Create an account with an explicit role on behalf of an administrator.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PermissionDenied` unless `caller` is an admin.
    /// Returns the same errors as [`Self::register`] otherwise.
    #[instrument(skip_all, fields(caller = %caller.profile_id, role = %input.role))]
    pub async fn create_user_account(
        &self,
        caller: &Caller,
        input: NewUserAccount,
    ) -> Result<Profile, AuthError> {
        // The new profile does not exist yet; any account id stands in for it.
        let proposed = Resource::Profile {
            account_id: AccountId::generate(),
        };
        policy::authorize(Some(caller), Operation::Create, &proposed)?;

        let metadata = ProvisionedFields {
            name: input.name,
            role: input.role,
            address: input.address,
        }
        .into_metadata();

        let (_, profile) = self
            .register(input.email.as_str(), &input.password, &metadata)
            .await?;
        Ok(profile)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (account, password_hash) = self
            .accounts
            .get_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(account)
    }

    /// Change an account's password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if `current` is wrong.
    /// Returns `AuthError::Validation` if `new` does not meet the password rules.
    #[instrument(skip(self, current, new))]
    pub async fn change_password(
        &self,
        account_id: AccountId,
        current: &str,
        new: &str,
    ) -> Result<(), AuthError> {
        let password_hash = self
            .accounts
            .get_password_hash(account_id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;
        verify_password(current, &password_hash)?;
        validate_password(new)?;

        let new_hash = hash_password(new)?;
        self.accounts
            .update_password(account_id, &new_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::AccountNotFound,
                other => AuthError::Repository(other),
            })?;

        tracing::info!("Password changed");
        Ok(())
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(err.into())
    }
}

/// Validate password meets requirements: 8-16 characters with at least one
/// uppercase letter and one special character.
///
/// # Errors
///
/// Returns `ValidationError::Password` naming the first rule broken.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        return Err(ValidationError::Password(format!(
            "password must be between {MIN_PASSWORD_LENGTH} and {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    if !password.chars().any(char::is_uppercase) {
        return Err(ValidationError::Password(
            "password must contain an uppercase letter".to_owned(),
        ));
    }

    if !password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
    {
        return Err(ValidationError::Password(
            "password must contain a special character".to_owned(),
        ));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
