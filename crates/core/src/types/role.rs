//! Account roles.
//!
//! Every account holds exactly one role. The role is stored in a single enum
//! column, so assigning a new role replaces the previous one.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The role an account holds.
///
/// Variants are declared in landing priority order: when a caller could land
/// on more than one dashboard, the earlier variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "projectopia.user_role", rename_all = "snake_case")
)]
pub enum Role {
    Admin,
    Supervisor,
    Student,
}

impl Role {
    /// All roles in landing priority order.
    pub const ALL: [Self; 3] = [Self::Admin, Self::Supervisor, Self::Student];

    /// Display name, matching the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Supervisor => "Supervisor",
            Self::Student => "Student",
        }
    }

    /// Whether this role may be chosen on the public registration form
    /// without an invite code.
    #[must_use]
    pub const fn is_self_registrable(self) -> bool {
        matches!(self, Self::Supervisor | Self::Student)
    }

    /// Whether accounts with this role appear in project memberships.
    #[must_use]
    pub const fn holds_memberships(self) -> bool {
        !matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`Role`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Parses a role name case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownRole(trimmed.to_owned()))
    }
}
