//! Session-related types for authentication.
//!
//! Only the account id lives in the session. The account itself is reloaded
//! on every request so that deletions, lockouts and role edits apply at once.

use serde::{Deserialize, Serialize};

use projectopia_core::UserId;

/// Session-stored identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Account's database ID.
    pub id: UserId,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the signed-in account.
    pub const CURRENT_USER: &str = "current_user";
}
