//! Account domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use projectopia_core::{Caller, Email, Lockout, ProjectId, Role, UserId};

/// An account (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique account ID.
    pub id: UserId,
    /// Display name.
    pub full_name: String,
    /// Login email (canonical form).
    pub email: Email,
    /// Optional phone number.
    pub phone: Option<String>,
    /// The single role this account holds.
    pub role: Role,
    /// Lockout state.
    #[serde(skip)]
    pub lockout: Lockout,
    /// Whether the next sign-in must set a new password.
    pub must_change_password: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the account may currently sign in.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lockout.is_active()
    }

    /// The identity requests run under.
    #[must_use]
    pub const fn caller(&self) -> Caller {
        Caller::new(self.id, self.role)
    }

    #[must_use]
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            role: self.role,
            is_active: self.is_active(),
        }
    }
}

/// Role-specific data: the projects an account is attached to through the
/// join tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role")]
pub enum RoleData {
    Admin,
    Supervisor { supervised: Vec<ProjectId> },
    Student { enrolled: Vec<ProjectId> },
}

/// One row of the admin user list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub full_name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(lockout: Lockout) -> User {
        User {
            id: UserId::new(3),
            full_name: "Tess Student".to_string(),
            email: Email::parse("tess@uni.edu").unwrap(),
            phone: None,
            role: Role::Student,
            lockout,
            must_change_password: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_reports_active_flag() {
        assert!(user(Lockout::none()).summary().is_active);
        assert!(!user(Lockout::forever()).summary().is_active);
    }

    #[test]
    fn test_caller_carries_role() {
        let caller = user(Lockout::none()).caller();
        assert_eq!(caller.id, UserId::new(3));
        assert_eq!(caller.role, Role::Student);
    }

    #[test]
    fn test_role_data_serializes_tagged() {
        let data = RoleData::Supervisor {
            supervised: vec![ProjectId::new(1)],
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json, serde_json::json!({"role": "Supervisor", "supervised": [1]}));
    }
}
