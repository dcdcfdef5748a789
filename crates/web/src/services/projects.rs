//! Scoped project queries and project mutations.
//!
//! Every read is filtered by the caller's [`ProjectScope`]. A project outside
//! the scope is reported as `NotFound`, the same as one that does not exist.

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use projectopia_core::input::ProjectForm;
use projectopia_core::{Caller, ProjectId, ProjectScope, Role, ValidationErrors};

use super::membership::reconcile;
use crate::db::{
    MembershipRepository, ProjectRepository, RepositoryError, UserRepository, memberships, projects,
};
use crate::models::{MemberSummary, ProjectWithMembers};

/// Errors from project operations.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// Project does not exist or is outside the caller's scope.
    #[error("project not found")]
    NotFound,

    /// Caller's role may not perform the operation.
    #[error("{0}")]
    Forbidden(&'static str),

    /// Submitted form failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// The project changed since the editor loaded it.
    #[error("project was modified by someone else (now at version {current})")]
    Conflict {
        /// Version currently stored.
        current: i32,
    },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for ProjectError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Choices for the project create/edit member pickers.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectFormOptions {
    pub supervisors: Vec<MemberSummary>,
    pub students: Vec<MemberSummary>,
}

/// Project service.
pub struct ProjectService<'a> {
    pool: &'a PgPool,
    projects: ProjectRepository<'a>,
    users: UserRepository<'a>,
    memberships: MembershipRepository<'a>,
}

impl<'a> ProjectService<'a> {
    /// Create a new project service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            projects: ProjectRepository::new(pool),
            users: UserRepository::new(pool),
            memberships: MembershipRepository::new(pool),
        }
    }

    /// Projects visible to `caller`, with members attached.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Repository` if the read fails.
    pub async fn list_for(&self, caller: Caller) -> Result<Vec<ProjectWithMembers>, ProjectError> {
        Ok(self.projects.list(caller.project_scope()).await?)
    }

    /// One project, if visible to `caller`.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::NotFound` if the project is absent or outside
    /// the caller's scope.
    pub async fn details(
        &self,
        caller: Caller,
        id: ProjectId,
    ) -> Result<ProjectWithMembers, ProjectError> {
        self.projects
            .get(caller.project_scope(), id)
            .await?
            .ok_or(ProjectError::NotFound)
    }

    /// Distinct students across the supervisor's projects.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Forbidden` if the caller is not a supervisor.
    pub async fn students_of_supervisor(
        &self,
        caller: Caller,
    ) -> Result<Vec<MemberSummary>, ProjectError> {
        if caller.role != Role::Supervisor {
            return Err(ProjectError::Forbidden("supervisors only"));
        }
        Ok(self.memberships.students_of_supervisor(caller.id).await?)
    }

    /// Distinct supervisors across the student's projects.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Forbidden` if the caller is not a student.
    pub async fn supervisors_of_student(
        &self,
        caller: Caller,
    ) -> Result<Vec<MemberSummary>, ProjectError> {
        if caller.role != Role::Student {
            return Err(ProjectError::Forbidden("students only"));
        }
        Ok(self.memberships.supervisors_of_student(caller.id).await?)
    }

    /// All supervisors and all students, for the member pickers.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Repository` if the read fails.
    pub async fn form_options(&self) -> Result<ProjectFormOptions, ProjectError> {
        Ok(ProjectFormOptions {
            supervisors: self.users.list_members_by_role(Role::Supervisor).await?,
            students: self.users.list_members_by_role(Role::Student).await?,
        })
    }

    /// Create a project and its memberships in one transaction.
    ///
    /// A supervisor creating a project is always one of its supervisors.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Forbidden` if the caller may not manage projects.
    /// Returns `ProjectError::Validation` listing every invalid field or member.
    #[instrument(skip(self, form), fields(caller = %caller.id))]
    pub async fn create(
        &self,
        caller: Caller,
        form: ProjectForm,
    ) -> Result<ProjectWithMembers, ProjectError> {
        if !caller.can_manage_projects() {
            return Err(ProjectError::Forbidden("only administrators and supervisors can create projects"));
        }

        let mut draft = form.validate()?;
        if caller.role == Role::Supervisor {
            draft.membership.include_supervisor(caller.id);
        }

        let mut tx = self.pool.begin().await?;
        let project = projects::insert(&mut *tx, &draft.name, &draft.details).await?;
        reconcile(&mut *tx, project.id, &draft.membership).await?;
        tx.commit().await?;

        tracing::info!(project_id = %project.id, "Project created");
        self.reload(project.id).await
    }

    /// Edit a project's fields and replace its memberships.
    ///
    /// A supervisor editing a project stays one of its supervisors.
    ///
    /// The form must carry the version the editor loaded. A newer stored
    /// version fails with `Conflict` and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Forbidden` if the caller may not manage projects.
    /// Returns `ProjectError::NotFound` if the project is absent or outside
    /// the caller's scope.
    /// Returns `ProjectError::Validation` listing every invalid field or member.
    /// Returns `ProjectError::Conflict` if the version is stale.
    #[instrument(skip(self, form), fields(caller = %caller.id))]
    pub async fn edit(
        &self,
        caller: Caller,
        id: ProjectId,
        form: ProjectForm,
    ) -> Result<ProjectWithMembers, ProjectError> {
        if !caller.can_manage_projects() {
            return Err(ProjectError::Forbidden("only administrators and supervisors can edit projects"));
        }

        let version = form.version;
        let mut draft = match (form.validate(), version) {
            (Ok(draft), Some(_)) => draft,
            (result, version) => {
                let mut errors = ValidationErrors::new();
                if version.is_none() {
                    errors.push("version", "Version is required");
                }
                if let Err(e) = result {
                    errors.merge(e);
                }
                return Err(ProjectError::Validation(errors));
            }
        };
        let expected_version = version.unwrap_or_default();
        if caller.role == Role::Supervisor {
            draft.membership.include_supervisor(caller.id);
        }

        let mut tx = self.pool.begin().await?;
        if projects::find_visible(&mut *tx, caller.project_scope(), id)
            .await?
            .is_none()
        {
            return Err(ProjectError::NotFound);
        }

        let current = projects::lock(&mut *tx, id)
            .await?
            .ok_or(ProjectError::NotFound)?;

        let Some(updated) =
            projects::update(&mut *tx, id, expected_version, &draft.name, &draft.details).await?
        else {
            tracing::info!(
                project_id = %id,
                expected_version,
                current_version = current.version,
                "Rejected stale project edit"
            );
            return Err(ProjectError::Conflict {
                current: current.version,
            });
        };

        reconcile(&mut *tx, id, &draft.membership).await?;
        tx.commit().await?;

        tracing::info!(project_id = %id, version = updated.version, "Project updated");
        self.reload(id).await
    }

    /// Delete a project and its memberships.
    ///
    /// Returns whether a project was removed. Deleting a missing project is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Forbidden` if the caller is not an administrator.
    #[instrument(skip(self), fields(caller = %caller.id))]
    pub async fn delete(&self, caller: Caller, id: ProjectId) -> Result<bool, ProjectError> {
        if !caller.can_delete_projects() {
            return Err(ProjectError::Forbidden("only administrators can delete projects"));
        }

        let mut tx = self.pool.begin().await?;
        if projects::lock(&mut *tx, id).await?.is_none() {
            return Ok(false);
        }

        let removed_members = memberships::clear_project(&mut *tx, id).await?;
        let deleted = projects::delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(project_id = %id, removed_members, "Project deleted");
        Ok(deleted)
    }

    async fn reload(&self, id: ProjectId) -> Result<ProjectWithMembers, ProjectError> {
        self.projects
            .get(ProjectScope::All, id)
            .await?
            .ok_or(ProjectError::NotFound)
    }
}
