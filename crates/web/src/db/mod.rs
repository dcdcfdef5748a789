//! Database operations for the `projectopia` schema.
//!
//! ## Tables
//!
//! - `users` - Accounts with a single role column and lockout state
//! - `projects` - Projects with an optimistic concurrency `version`
//! - `supervisor_projects` - Supervisor memberships, unique per pair
//! - `project_students` - Student memberships, unique per pair
//! - `session` - tower-sessions storage
//!
//! Reads go through repository structs holding the pool. Writes that must
//! commit together take a `&mut PgConnection` so callers can run them inside
//! one transaction.
//!
//! All queries are runtime queries so the crate builds without a database
//! or an offline query cache.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p projectopia-cli -- migrate
//! ```

pub mod memberships;
pub mod projects;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use memberships::MembershipRepository;
pub use projects::ProjectRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Collect raw ids for binding as a Postgres `int4[]`.
pub(crate) fn raw_ids<I, T>(ids: I) -> Vec<i32>
where
    I: IntoIterator<Item = T>,
    T: Into<i32>,
{
    ids.into_iter().map(Into::into).collect()
}
