//! Development sample accounts.
//!
//! One account per role, created only when missing. Never enable this
//! against a production database.

use sqlx::PgPool;

use projectopia_core::input::UserProfile;
use projectopia_core::{Email, EmailError, Role};

use crate::db::{RepositoryError, UserRepository, users};
use crate::services::{AuthError, auth::hash_password};

/// Email, full name, role and password of each sample account.
pub const SAMPLE_ACCOUNTS: [(&str, &str, Role, &str); 3] = [
    ("admin@example.com", "Sample Admin", Role::Admin, "Admin@123"),
    (
        "supervisor@example.com",
        "Sample Supervisor",
        Role::Supervisor,
        "Supervisor@123",
    ),
    (
        "student@example.com",
        "Sample Student",
        Role::Student,
        "Student@123",
    ),
];

/// Errors from seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("invalid sample email: {0}")]
    Email(#[from] EmailError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("password hashing failed: {0}")]
    Auth(#[from] AuthError),
}

/// Create any sample account that does not exist yet.
///
/// Returns how many accounts were created.
///
/// # Errors
///
/// Returns an error if a lookup or insert fails.
pub async fn ensure_sample_accounts(pool: &PgPool) -> Result<usize, SeedError> {
    let repo = UserRepository::new(pool);
    let mut created = 0;

    for (email, full_name, role, password) in SAMPLE_ACCOUNTS {
        let email = Email::parse(email)?;
        if repo.get_by_email(&email).await?.is_some() {
            continue;
        }

        let profile = UserProfile {
            full_name: full_name.to_string(),
            email,
            phone: None,
            role,
        };
        let password_hash = hash_password(password)?;

        let mut conn = pool.acquire().await.map_err(RepositoryError::from)?;
        let user = users::insert(&mut *conn, &profile, &password_hash, false).await?;
        tracing::info!(user_id = %user.id, role = %role, "Sample account created");
        created += 1;
    }

    Ok(created)
}
