//! Authentication service.
//!
//! Password registration, login and password changes. Passwords are hashed
//! with Argon2id.

mod error;

pub use error::AuthError;

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::distr::{Alphanumeric, SampleString};
use sqlx::PgPool;
use tracing::instrument;

use projectopia_core::input::{ChangePasswordForm, LoginForm, RegistrationForm};
use projectopia_core::{UserId, ValidationErrors};

use crate::db::RepositoryError;
use crate::db::users::{self, UserRepository};
use crate::models::User;

/// Length of generated temporary passwords.
const TEMPORARY_PASSWORD_LENGTH: usize = 16;

/// Hash of a discarded random password. Login verifies against it when the
/// email is unknown.
static UNKNOWN_ACCOUNT_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password(&generate_temporary_password()).ok());

/// Authentication service.
pub struct AuthService<'a> {
    pool: &'a PgPool,
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            users: UserRepository::new(pool),
        }
    }

    /// Register a new account from the public registration form.
    ///
    /// `admin_invite_code` is the configured invite code; administrator
    /// registration is refused when it is `None`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` listing every invalid field, including
    /// an already registered email.
    #[instrument(skip(self, form, admin_invite_code), fields(email = %form.email, role = %form.role))]
    pub async fn register(
        &self,
        form: RegistrationForm,
        admin_invite_code: Option<&str>,
    ) -> Result<User, AuthError> {
        let registration = form.validate(admin_invite_code)?;
        let password_hash = hash_password(&registration.password)?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let user = users::insert(&mut *tx, &registration.profile, &password_hash, false)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::Validation(ValidationErrors::single(
                    "email",
                    format!("Email '{}' is already taken.", registration.profile.email),
                )),
                other => AuthError::Repository(other),
            })?;
        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(user_id = %user.id, role = %user.role, "Account registered");
        Ok(user)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if a field is missing.
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    /// Returns `AuthError::LockedOut` if the account is locked.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn login(&self, form: LoginForm) -> Result<User, AuthError> {
        let (email, password) = form.validate()?;

        let Some((user, password_hash)) = self.users.get_password_hash(&email).await? else {
            if let Some(hash) = UNKNOWN_ACCOUNT_HASH.as_deref() {
                verify_password(&password, hash)?;
            }
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(&password, &password_hash)?;

        if !user.is_active() {
            tracing::warn!(user_id = %user.id, "Sign-in refused for locked account");
            return Err(AuthError::LockedOut);
        }

        Ok(user)
    }

    /// Replace the signed-in account's password.
    ///
    /// Clears the must-change-password flag.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the form is invalid or the current
    /// password is wrong.
    /// Returns `AuthError::UserNotFound` if the account no longer exists.
    #[instrument(skip(self, form))]
    pub async fn change_password(
        &self,
        user_id: UserId,
        form: ChangePasswordForm,
    ) -> Result<(), AuthError> {
        let form = form.validate()?;

        let current_hash = self
            .users
            .get_password_hash_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if verify_password(&form.current_password, &current_hash).is_err() {
            return Err(AuthError::Validation(ValidationErrors::single(
                "current_password",
                "Incorrect password.",
            )));
        }

        let new_hash = hash_password(&form.new_password)?;
        self.users
            .update_password(user_id, &new_hash, false)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(%user_id, "Password changed");
        Ok(())
    }
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
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the password does not match or
/// the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// A random alphanumeric password for admin-created accounts.
#[must_use]
pub fn generate_temporary_password() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), TEMPORARY_PASSWORD_LENGTH)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Student@123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Student@123", &hash).is_ok());
        assert!(matches!(
            verify_password("student@123", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_unknown_account_hash_rejects_every_password() {
        let hash = UNKNOWN_ACCOUNT_HASH.as_deref().unwrap();
        assert!(hash.starts_with("$argon2id$"));
        for password in ["Admin@123", "", "Welcome@1"] {
            assert!(matches!(
                verify_password(password, hash),
                Err(AuthError::InvalidCredentials)
            ));
        }
    }

    #[test]
    fn test_temporary_password_shape() {
        let password = generate_temporary_password();
        assert_eq!(password.len(), TEMPORARY_PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(password, generate_temporary_password());
    }
}
