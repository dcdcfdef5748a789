//! Supervisor and student membership rows.
//!
//! Join rows are only written as a side effect of project create/edit/delete
//! or account edit/delete, so every write here takes a connection that is
//! already inside the caller's transaction.

use sqlx::{PgConnection, PgPool};

use projectopia_core::{Membership, ProjectId, Role, UserId};

use super::users::MemberRow;
use super::{RepositoryError, raw_ids};
use crate::models::MemberSummary;

/// Rows removed by [`remove_for_user`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovedMemberships {
    pub supervised: u64,
    pub enrolled: u64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for cross-project membership reads.
pub struct MembershipRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MembershipRepository<'a> {
    /// Create a new membership repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Distinct students across every project `supervisor` supervises.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn students_of_supervisor(
        &self,
        supervisor: UserId,
    ) -> Result<Vec<MemberSummary>, RepositoryError> {
        let rows: Vec<MemberRow> = sqlx::query_as(
            r"
            SELECT DISTINCT u.id, u.full_name, u.email
            FROM projectopia.supervisor_projects sp
            JOIN projectopia.project_students ps ON ps.project_id = sp.project_id
            JOIN projectopia.users u ON u.id = ps.student_id
            WHERE sp.supervisor_id = $1
            ORDER BY u.full_name, u.id
            ",
        )
        .bind(supervisor.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Distinct supervisors across every project `student` is enrolled in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn supervisors_of_student(
        &self,
        student: UserId,
    ) -> Result<Vec<MemberSummary>, RepositoryError> {
        let rows: Vec<MemberRow> = sqlx::query_as(
            r"
            SELECT DISTINCT u.id, u.full_name, u.email
            FROM projectopia.project_students ps
            JOIN projectopia.supervisor_projects sp ON sp.project_id = ps.project_id
            JOIN projectopia.users u ON u.id = sp.supervisor_id
            WHERE ps.student_id = $1
            ORDER BY u.full_name, u.id
            ",
        )
        .bind(student.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// IDs of the projects an account is attached to in `role`.
    ///
    /// Administrators hold no memberships, so the list is empty for them.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn project_ids_for(
        &self,
        user: UserId,
        role: Role,
    ) -> Result<Vec<ProjectId>, RepositoryError> {
        let sql = match role {
            Role::Admin => return Ok(Vec::new()),
            Role::Supervisor => {
                "SELECT project_id FROM projectopia.supervisor_projects \
                 WHERE supervisor_id = $1 ORDER BY project_id"
            }
            Role::Student => {
                "SELECT project_id FROM projectopia.project_students \
                 WHERE student_id = $1 ORDER BY project_id"
            }
        };

        let rows: Vec<(i32,)> = sqlx::query_as(sql)
            .bind(user.as_i32())
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(|(id,)| ProjectId::new(id)).collect())
    }
}

// =============================================================================
// Transactional operations
// =============================================================================

/// The current supervisor and student sets of a project.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn current(
    conn: &mut PgConnection,
    project: ProjectId,
) -> Result<Membership, RepositoryError> {
    let supervisors: Vec<(i32,)> = sqlx::query_as(
        "SELECT supervisor_id FROM projectopia.supervisor_projects WHERE project_id = $1",
    )
    .bind(project.as_i32())
    .fetch_all(&mut *conn)
    .await?;

    let students: Vec<(i32,)> =
        sqlx::query_as("SELECT student_id FROM projectopia.project_students WHERE project_id = $1")
            .bind(project.as_i32())
            .fetch_all(&mut *conn)
            .await?;

    Ok(Membership::from_ids(
        supervisors.into_iter().map(|(id,)| UserId::new(id)),
        students.into_iter().map(|(id,)| UserId::new(id)),
    ))
}

/// The stored role of each existing account among `ids`.
///
/// IDs without an account are absent from the result.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn roles_of(
    conn: &mut PgConnection,
    ids: &[UserId],
) -> Result<Vec<(UserId, Role)>, RepositoryError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<(i32, Role)> =
        sqlx::query_as("SELECT id, role FROM projectopia.users WHERE id = ANY($1)")
            .bind(raw_ids(ids.iter().copied()))
            .fetch_all(&mut *conn)
            .await?;

    Ok(rows
        .into_iter()
        .map(|(id, role)| (UserId::new(id), role))
        .collect())
}

/// Delete every membership row of a project and insert `desired`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a statement fails, including
/// foreign key violations for IDs that do not exist.
pub async fn replace(
    conn: &mut PgConnection,
    project: ProjectId,
    desired: &Membership,
) -> Result<(), RepositoryError> {
    clear_project(conn, project).await?;

    if !desired.supervisors.is_empty() {
        sqlx::query(
            r"
            INSERT INTO projectopia.supervisor_projects (project_id, supervisor_id)
            SELECT $1, UNNEST($2::int4[])
            ",
        )
        .bind(project.as_i32())
        .bind(raw_ids(desired.supervisors.iter().copied()))
        .execute(&mut *conn)
        .await?;
    }

    if !desired.students.is_empty() {
        sqlx::query(
            r"
            INSERT INTO projectopia.project_students (project_id, student_id)
            SELECT $1, UNNEST($2::int4[])
            ",
        )
        .bind(project.as_i32())
        .bind(raw_ids(desired.students.iter().copied()))
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Delete every membership row of a project. Returns the number of rows removed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a statement fails.
pub async fn clear_project(
    conn: &mut PgConnection,
    project: ProjectId,
) -> Result<u64, RepositoryError> {
    let supervisors = sqlx::query("DELETE FROM projectopia.supervisor_projects WHERE project_id = $1")
        .bind(project.as_i32())
        .execute(&mut *conn)
        .await?;

    let students = sqlx::query("DELETE FROM projectopia.project_students WHERE project_id = $1")
        .bind(project.as_i32())
        .execute(&mut *conn)
        .await?;

    Ok(supervisors.rows_affected() + students.rows_affected())
}

/// Delete every membership row that references an account.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a statement fails.
pub async fn remove_for_user(
    conn: &mut PgConnection,
    user: UserId,
) -> Result<RemovedMemberships, RepositoryError> {
    let supervised =
        sqlx::query("DELETE FROM projectopia.supervisor_projects WHERE supervisor_id = $1")
            .bind(user.as_i32())
            .execute(&mut *conn)
            .await?;

    let enrolled = sqlx::query("DELETE FROM projectopia.project_students WHERE student_id = $1")
        .bind(user.as_i32())
        .execute(&mut *conn)
        .await?;

    Ok(RemovedMemberships {
        supervised: supervised.rows_affected(),
        enrolled: enrolled.rows_affected(),
    })
}
