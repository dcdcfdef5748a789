//! Authentication error types.

use thiserror::Error;

use projectopia_core::ValidationErrors;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Submitted form failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// Invalid credentials (wrong password or unknown email).
    #[error("invalid login attempt")]
    InvalidCredentials,

    /// Account is locked by an administrator.
    #[error("account is locked")]
    LockedOut,

    /// Account not found.
    #[error("user not found")]
    UserNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
