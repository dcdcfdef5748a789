//! Caller identity and project visibility.
//!
//! Administrators see every project. Supervisors and students see only the
//! projects they are associated with through the join tables. A project
//! outside the caller's scope is reported as missing, never as forbidden, so
//! its existence is not revealed.

use serde::{Deserialize, Serialize};

use crate::types::{Role, UserId};

/// The authenticated account a request acts on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caller {
    pub id: UserId,
    pub role: Role,
}

impl Caller {
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// The subset of projects this caller may read.
    #[must_use]
    pub const fn project_scope(&self) -> ProjectScope {
        match self.role {
            Role::Admin => ProjectScope::All,
            Role::Supervisor => ProjectScope::Supervised(self.id),
            Role::Student => ProjectScope::Enrolled(self.id),
        }
    }

    /// Whether the caller may create and edit projects.
    #[must_use]
    pub const fn can_manage_projects(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Supervisor)
    }

    /// Whether the caller may delete projects.
    #[must_use]
    pub const fn can_delete_projects(&self) -> bool {
        self.is_admin()
    }
}

/// Which projects a read returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectScope {
    /// Every project.
    All,
    /// Projects with a supervisor association for this user.
    Supervised(UserId),
    /// Projects with a student association for this user.
    Enrolled(UserId),
}

/// Where a freshly signed-in account lands.
///
/// The highest-priority role wins (Admin, then Supervisor, then Student).
/// An account with no recognised role lands on `/`.
#[must_use]
pub fn landing_path<I>(roles: I) -> &'static str
where
    I: IntoIterator<Item = Role>,
{
    match roles.into_iter().min() {
        Some(Role::Admin) => "/Admin",
        Some(Role::Supervisor) => "/Supervisor",
        Some(Role::Student) => "/Student",
        None => "/",
    }
}
