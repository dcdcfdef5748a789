//! Project repository (the relationship store's project side).
//!
//! Scoped reads load the visible projects with one query and then each
//! membership kind with one `project_id = ANY($1)` query. All three run in a
//! single read-only repeatable-read transaction so members and projects come
//! from the same snapshot.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use projectopia_core::{ProjectId, ProjectScope};

use super::users::MemberRow;
use super::{RepositoryError, raw_ids};
use crate::models::{MemberSummary, Project, ProjectWithMembers};

const PROJECT_COLUMNS: &str = "p.id, p.name, p.details, p.version, p.created_at, p.updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProjectRow {
    id: i32,
    name: String,
    details: String,
    version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: ProjectId::new(row.id),
            name: row.name,
            details: row.details,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProjectMemberRow {
    project_id: i32,
    #[sqlx(flatten)]
    member: MemberRow,
}

/// Build the `FROM ... WHERE` part of a scoped project read.
///
/// Returns the SQL fragment and the user id to bind as `$1`, if any.
fn scope_clause(scope: ProjectScope) -> (&'static str, Option<i32>) {
    match scope {
        ProjectScope::All => ("FROM projectopia.projects p WHERE TRUE", None),
        ProjectScope::Supervised(user) => (
            "FROM projectopia.projects p \
             JOIN projectopia.supervisor_projects sp ON sp.project_id = p.id \
             WHERE sp.supervisor_id = $1",
            Some(user.as_i32()),
        ),
        ProjectScope::Enrolled(user) => (
            "FROM projectopia.projects p \
             JOIN projectopia.project_students ps ON ps.project_id = p.id \
             WHERE ps.student_id = $1",
            Some(user.as_i32()),
        ),
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for scoped project reads.
pub struct ProjectRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProjectRepository<'a> {
    /// Create a new project repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every project visible under `scope`, ordered by name, with members attached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if member data is invalid.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        scope: ProjectScope,
    ) -> Result<Vec<ProjectWithMembers>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let (clause, user) = scope_clause(scope);
        let sql = format!("SELECT {PROJECT_COLUMNS} {clause} ORDER BY p.name, p.id");
        let mut query = sqlx::query_as::<_, ProjectRow>(&sql);
        if let Some(user) = user {
            query = query.bind(user);
        }
        let rows = query.fetch_all(&mut *tx).await?;

        let projects = rows.into_iter().map(Project::from).collect();
        let projects = attach_members(&mut *tx, projects).await?;
        tx.commit().await?;
        Ok(projects)
    }

    /// One project, only if it is visible under `scope`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if member data is invalid.
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        scope: ProjectScope,
        id: ProjectId,
    ) -> Result<Option<ProjectWithMembers>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let Some(project) = find_visible(&mut *tx, scope, id).await? else {
            return Ok(None);
        };

        let mut loaded = attach_members(&mut *tx, vec![project]).await?;
        tx.commit().await?;
        Ok(loaded.pop())
    }

    /// Total number of projects.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projectopia.projects")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

/// Load the supervisors and students of `projects`, keeping their order.
async fn attach_members(
    conn: &mut PgConnection,
    projects: Vec<Project>,
) -> Result<Vec<ProjectWithMembers>, RepositoryError> {
    if projects.is_empty() {
        return Ok(Vec::new());
    }

    let ids = raw_ids(projects.iter().map(|p| p.id));

    let supervisor_rows: Vec<ProjectMemberRow> = sqlx::query_as(
        r"
        SELECT sp.project_id, u.id, u.full_name, u.email
        FROM projectopia.supervisor_projects sp
        JOIN projectopia.users u ON u.id = sp.supervisor_id
        WHERE sp.project_id = ANY($1)
        ORDER BY u.full_name, u.id
        ",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let student_rows: Vec<ProjectMemberRow> = sqlx::query_as(
        r"
        SELECT ps.project_id, u.id, u.full_name, u.email
        FROM projectopia.project_students ps
        JOIN projectopia.users u ON u.id = ps.student_id
        WHERE ps.project_id = ANY($1)
        ORDER BY u.full_name, u.id
        ",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut supervisors = group_by_project(supervisor_rows)?;
    let mut students = group_by_project(student_rows)?;

    Ok(projects
        .into_iter()
        .map(|project| {
            let key = project.id.as_i32();
            ProjectWithMembers {
                supervisors: supervisors.remove(&key).unwrap_or_default(),
                students: students.remove(&key).unwrap_or_default(),
                project,
            }
        })
        .collect())
}

fn group_by_project(
    rows: Vec<ProjectMemberRow>,
) -> Result<HashMap<i32, Vec<MemberSummary>>, RepositoryError> {
    let mut grouped: HashMap<i32, Vec<MemberSummary>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.project_id)
            .or_default()
            .push(row.member.try_into()?);
    }
    Ok(grouped)
}

// =============================================================================
// Transactional operations
// =============================================================================

/// A project row, only if it is visible under `scope`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_visible(
    conn: &mut PgConnection,
    scope: ProjectScope,
    id: ProjectId,
) -> Result<Option<Project>, RepositoryError> {
    let (clause, user) = scope_clause(scope);
    let id_param = if user.is_some() { "$2" } else { "$1" };
    let sql = format!("SELECT {PROJECT_COLUMNS} {clause} AND p.id = {id_param}");

    let mut query = sqlx::query_as::<_, ProjectRow>(&sql);
    if let Some(user) = user {
        query = query.bind(user);
    }
    let row = query.bind(id.as_i32()).fetch_optional(&mut *conn).await?;

    Ok(row.map(Project::from))
}

/// Load a project and lock its row for the rest of the transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock(
    conn: &mut PgConnection,
    id: ProjectId,
) -> Result<Option<Project>, RepositoryError> {
    let row: Option<ProjectRow> = sqlx::query_as(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projectopia.projects p WHERE p.id = $1 FOR UPDATE"
    ))
    .bind(id.as_i32())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Project::from))
}

/// Insert a project at version 1.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn insert(
    conn: &mut PgConnection,
    name: &str,
    details: &str,
) -> Result<Project, RepositoryError> {
    let row: ProjectRow = sqlx::query_as(
        r"
        INSERT INTO projectopia.projects (name, details)
        VALUES ($1, $2)
        RETURNING id, name, details, version, created_at, updated_at
        ",
    )
    .bind(name)
    .bind(details)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into())
}

/// Update name and details if the stored version still equals `expected_version`.
///
/// Returns `None` when the version no longer matches (or the row is gone).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn update(
    conn: &mut PgConnection,
    id: ProjectId,
    expected_version: i32,
    name: &str,
    details: &str,
) -> Result<Option<Project>, RepositoryError> {
    let row: Option<ProjectRow> = sqlx::query_as(
        r"
        UPDATE projectopia.projects
        SET name = $3, details = $4, version = version + 1, updated_at = NOW()
        WHERE id = $1 AND version = $2
        RETURNING id, name, details, version, created_at, updated_at
        ",
    )
    .bind(id.as_i32())
    .bind(expected_version)
    .bind(name)
    .bind(details)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Project::from))
}

/// Delete a project. Returns whether a row was removed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn delete(conn: &mut PgConnection, id: ProjectId) -> Result<bool, RepositoryError> {
    let result = sqlx::query("DELETE FROM projectopia.projects WHERE id = $1")
        .bind(id.as_i32())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use projectopia_core::UserId;

    use super::*;

    #[test]
    fn test_scope_clause_binds_user_for_member_scopes() {
        let (all, user) = scope_clause(ProjectScope::All);
        assert!(user.is_none());
        assert!(!all.contains("$1"));

        let (supervised, user) = scope_clause(ProjectScope::Supervised(UserId::new(5)));
        assert_eq!(user, Some(5));
        assert!(supervised.contains("supervisor_projects"));

        let (enrolled, user) = scope_clause(ProjectScope::Enrolled(UserId::new(6)));
        assert_eq!(user, Some(6));
        assert!(enrolled.contains("project_students"));
    }
}
