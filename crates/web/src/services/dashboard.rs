//! Per-role dashboard summaries.

use serde::Serialize;
use sqlx::PgPool;

use projectopia_core::{Caller, Role};

use super::projects::ProjectError;
use crate::db::{ProjectRepository, UserRepository};
use crate::models::ProjectWithMembers;

/// Administrator totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdminDashboard {
    pub total_users: i64,
    pub total_projects: i64,
    pub total_students: i64,
    pub total_supervisors: i64,
}

/// A supervisor's projects and student count.
#[derive(Debug, Clone, Serialize)]
pub struct SupervisorDashboard {
    pub total_projects: usize,
    /// Student memberships across the supervisor's projects. A student in two
    /// of those projects counts twice.
    pub total_students: usize,
    pub projects: Vec<ProjectWithMembers>,
}

/// A student's projects and supervisor count.
#[derive(Debug, Clone, Serialize)]
pub struct StudentDashboard {
    pub total_projects: usize,
    /// Supervisor memberships across the student's projects.
    pub total_supervisors: usize,
    pub projects: Vec<ProjectWithMembers>,
}

impl SupervisorDashboard {
    fn from_projects(projects: Vec<ProjectWithMembers>) -> Self {
        Self {
            total_projects: projects.len(),
            total_students: projects.iter().map(|p| p.students.len()).sum(),
            projects,
        }
    }
}

impl StudentDashboard {
    fn from_projects(projects: Vec<ProjectWithMembers>) -> Self {
        Self {
            total_projects: projects.len(),
            total_supervisors: projects.iter().map(|p| p.supervisors.len()).sum(),
            projects,
        }
    }
}

/// Dashboard queries.
pub struct DashboardService<'a> {
    projects: ProjectRepository<'a>,
    users: UserRepository<'a>,
}

impl<'a> DashboardService<'a> {
    /// Create a new dashboard service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            projects: ProjectRepository::new(pool),
            users: UserRepository::new(pool),
        }
    }

    /// Account and project totals.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Forbidden` if the caller is not an administrator.
    pub async fn admin(&self, caller: Caller) -> Result<AdminDashboard, ProjectError> {
        if !caller.is_admin() {
            return Err(ProjectError::Forbidden("administrators only"));
        }
        let counts = self.users.count_by_role().await?;
        let total_projects = self.projects.count().await?;

        Ok(AdminDashboard {
            total_users: counts.total,
            total_projects,
            total_students: counts.students,
            total_supervisors: counts.supervisors,
        })
    }

    /// The caller's supervised projects.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Forbidden` if the caller is not a supervisor.
    pub async fn supervisor(&self, caller: Caller) -> Result<SupervisorDashboard, ProjectError> {
        if caller.role != Role::Supervisor {
            return Err(ProjectError::Forbidden("supervisors only"));
        }
        let projects = self.projects.list(caller.project_scope()).await?;
        Ok(SupervisorDashboard::from_projects(projects))
    }

    /// The caller's enrolled projects.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Forbidden` if the caller is not a student.
    pub async fn student(&self, caller: Caller) -> Result<StudentDashboard, ProjectError> {
        if caller.role != Role::Student {
            return Err(ProjectError::Forbidden("students only"));
        }
        let projects = self.projects.list(caller.project_scope()).await?;
        Ok(StudentDashboard::from_projects(projects))
    }
}
