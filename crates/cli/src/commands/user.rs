//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create the first administrator
//! projectopia user create -e admin@uni.edu -n "Ada Admin" -r Admin
//!
//! # Create a student with a phone number
//! projectopia user create -e tess@uni.edu -n "Tess Student" -r Student -p 555-0100
//! ```
//!
//! The account gets a temporary password (`PROJECTOPIA_DEFAULT_PASSWORD` if
//! set, random otherwise) and must change it at first sign-in.

use thiserror::Error;

use projectopia_core::ValidationErrors;
use projectopia_core::input::UserForm;
use projectopia_web::db::{RepositoryError, users};
use projectopia_web::services::AuthError;
use projectopia_web::services::auth::{generate_temporary_password, hash_password};

use super::CommandError;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum UserCommandError {
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Invalid fields.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// Email already registered or other database failure.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    #[error("{0}")]
    Auth(#[from] AuthError),
}

/// Create an account.
///
/// # Returns
///
/// The ID of the created account.
///
/// # Errors
///
/// Returns an error if a field is invalid, the email is taken or the
/// database is unreachable.
pub async fn create(
    email: &str,
    name: &str,
    role: &str,
    phone: Option<String>,
) -> Result<i32, UserCommandError> {
    let profile = UserForm {
        full_name: name.to_owned(),
        email: email.to_owned(),
        phone,
        role: role.to_owned(),
    }
    .validate()?;

    let pool = super::connect().await?;

    let temporary_password = std::env::var("PROJECTOPIA_DEFAULT_PASSWORD")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(generate_temporary_password);
    let password_hash = hash_password(&temporary_password)?;

    tracing::info!("Creating account: {} ({})", profile.email, profile.role);

    let mut conn = pool.acquire().await.map_err(CommandError::from)?;
    let user = users::insert(&mut *conn, &profile, &password_hash, true).await?;

    tracing::info!("Account created successfully!");
    tracing::info!("  ID: {}", user.id);
    tracing::info!("  Email: {}", user.email);
    tracing::info!("  Role: {}", user.role);
    tracing::info!("  Temporary password: {temporary_password}");
    tracing::warn!("The password must be changed at first sign-in.");

    Ok(user.id.as_i32())
}
