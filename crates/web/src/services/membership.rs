//! Membership reconciler.
//!
//! Replaces a project's supervisor and student sets with a desired set inside
//! the caller's transaction. Existing join rows are deleted and one row per
//! distinct desired ID is inserted, so row identity does not survive an edit.

use sqlx::PgConnection;
use tracing::instrument;

use projectopia_core::{Membership, MembershipChanges, ProjectId, Role, UserId, ValidationErrors};

use super::projects::ProjectError;
use crate::db::{memberships, projects};

/// Replace the memberships of `project` with `desired`.
///
/// The project row is locked first, so concurrent reconciles of the same
/// project serialize. Every desired supervisor must be an account with the
/// Supervisor role and every desired student one with the Student role;
/// otherwise nothing is written and all offending IDs are reported.
///
/// # Errors
///
/// Returns `ProjectError::NotFound` if the project does not exist.
/// Returns `ProjectError::Validation` listing every invalid member ID.
/// Returns `ProjectError::Repository` if a statement fails.
#[instrument(skip(conn, desired), fields(project_id = %project))]
pub async fn reconcile(
    conn: &mut PgConnection,
    project: ProjectId,
    desired: &Membership,
) -> Result<MembershipChanges, ProjectError> {
    projects::lock(conn, project)
        .await?
        .ok_or(ProjectError::NotFound)?;

    if !desired.is_empty() {
        validate_members(conn, desired).await?;
    }

    let current = memberships::current(conn, project).await?;
    memberships::replace(conn, project, desired).await?;

    let changes = current.diff(desired);
    if changes.is_empty() {
        tracing::debug!("Project membership unchanged");
        return Ok(changes);
    }
    tracing::info!(
        supervisors_added = changes.supervisors_added.len(),
        supervisors_removed = changes.supervisors_removed.len(),
        students_added = changes.students_added.len(),
        students_removed = changes.students_removed.len(),
        "Project membership reconciled"
    );
    Ok(changes)
}

/// Check that every desired member exists with the matching role.
async fn validate_members(
    conn: &mut PgConnection,
    desired: &Membership,
) -> Result<(), ProjectError> {
    let ids: Vec<UserId> = desired
        .supervisors
        .iter()
        .chain(desired.students.iter())
        .copied()
        .collect();
    let roles = memberships::roles_of(conn, &ids).await?;

    let errors = member_errors(desired, &roles);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ProjectError::Validation(errors))
    }
}

fn member_errors(desired: &Membership, roles: &[(UserId, Role)]) -> ValidationErrors {
    let role_of = |id: UserId| roles.iter().find(|(u, _)| *u == id).map(|(_, r)| *r);
    let mut errors = ValidationErrors::new();

    for &id in &desired.supervisors {
        if role_of(id) != Some(Role::Supervisor) {
            errors.push("supervisor_ids", format!("User {id} is not a supervisor"));
        }
    }
    for &id in &desired.students {
        if role_of(id) != Some(Role::Student) {
            errors.push("student_ids", format!("User {id} is not a student"));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[i32]) -> Vec<UserId> {
        raw.iter().copied().map(UserId::new).collect()
    }

    #[test]
    fn test_member_errors_accepts_matching_roles() {
        let desired = Membership::from_ids(ids(&[1]), ids(&[2, 3]));
        let roles = vec![
            (UserId::new(1), Role::Supervisor),
            (UserId::new(2), Role::Student),
            (UserId::new(3), Role::Student),
        ];
        assert!(member_errors(&desired, &roles).is_empty());
    }

    #[test]
    fn test_member_errors_lists_every_offender() {
        // 1 is a student, 9 does not exist, 4 is an admin
        let desired = Membership::from_ids(ids(&[1, 9]), ids(&[2, 4]));
        let roles = vec![
            (UserId::new(1), Role::Student),
            (UserId::new(2), Role::Student),
            (UserId::new(4), Role::Admin),
        ];

        let errors = member_errors(&desired, &roles);
        assert_eq!(errors.len(), 3);
        let messages: Vec<_> = errors.errors().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            [
                "User 1 is not a supervisor",
                "User 9 is not a supervisor",
                "User 4 is not a student"
            ]
        );
    }

    #[test]
    fn test_member_errors_empty_membership() {
        assert!(member_errors(&Membership::default(), &[]).is_empty());
    }
}
