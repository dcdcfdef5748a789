//! Integration tests for Projectopia.
//!
//! # Running Tests
//!
//! ```bash
//! # Router tests (no database needed)
//! cargo test -p projectopia-integration-tests
//!
//! # Database tests: each one gets a fresh database with migrations applied
//! DATABASE_URL=postgres://localhost/projectopia_test \
//!     cargo test -p projectopia-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `router` - HTTP routing and extractor behavior over a lazy pool
//! - `projects` - Scoped queries, reconciliation and project mutations
//! - `users` - Account lifecycle, registration and sign-in
//! - `sessions` - Signed-in requests observing account changes

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::time::Duration;

use secrecy::SecretString;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use projectopia_core::input::{ProjectForm, UserProfile};
use projectopia_core::{Email, Role, UserId};
use projectopia_web::config::AppConfig;
use projectopia_web::db::users;
use projectopia_web::models::User;
use projectopia_web::state::AppState;

/// Invite code configured by [`test_config`].
pub const TEST_INVITE_CODE: &str = "q7Z-mK2p-Wx9r";

/// Configuration for tests. Nothing here is read from the environment.
#[must_use]
pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: SecretString::from("postgres://localhost/projectopia_unused"),
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        admin_invite_code: Some(SecretString::from(TEST_INVITE_CODE)),
        default_password: None,
        seed_sample_accounts: false,
        log_json: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// State over a pool that never connects unless a query runs. A query fails
/// within a second: nothing listens on the configured port.
#[must_use]
pub fn lazy_state() -> AppState {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(1))
        .connect_lazy("postgres://127.0.0.1:1/projectopia_unused")
        .unwrap();
    AppState::new(test_config(), pool)
}

/// Insert an account directly. The stored hash is not a valid PHC string,
/// so the account cannot sign in.
pub async fn create_user(pool: &PgPool, name: &str, role: Role) -> User {
    let profile = UserProfile {
        full_name: name.to_string(),
        email: Email::parse(&format!("{}@uni.edu", name.to_lowercase().replace(' ', "."))).unwrap(),
        phone: None,
        role,
    };
    let mut conn = pool.acquire().await.unwrap();
    users::insert(&mut *conn, &profile, "not-a-hash", false)
        .await
        .unwrap()
}

/// A project form with the given members.
#[must_use]
pub fn project_form(name: &str, supervisors: &[UserId], students: &[UserId]) -> ProjectForm {
    ProjectForm {
        name: name.to_string(),
        details: format!("{name} details"),
        supervisor_ids: supervisors.to_vec(),
        student_ids: students.to_vec(),
        version: None,
    }
}
