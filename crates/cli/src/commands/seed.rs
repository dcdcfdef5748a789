//! Seed the database with one sample account per role.
//!
//! Development only: the sample passwords are public.

use tracing::info;

use projectopia_web::seed::{SAMPLE_ACCOUNTS, ensure_sample_accounts};

/// Create any missing sample account.
///
/// # Errors
///
/// Returns an error if the connection or an insert fails.
pub async fn sample_accounts() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    let created = ensure_sample_accounts(&pool).await?;

    info!("Seeding complete!");
    info!("  Accounts created: {created}");
    info!("  Already present: {}", SAMPLE_ACCOUNTS.len() - created);
    for (email, _, role, _) in SAMPLE_ACCOUNTS {
        info!("    {role}: {email}");
    }

    Ok(())
}
