//! Project domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use projectopia_core::{Email, Membership, ProjectId, UserId};

/// A project (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub details: String,
    /// Optimistic concurrency token. Starts at 1 and increments on every edit.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A supervisor or student attached to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberSummary {
    pub id: UserId,
    pub full_name: String,
    pub email: Email,
}

/// A project with its members eagerly loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectWithMembers {
    #[serde(flatten)]
    pub project: Project,
    pub supervisors: Vec<MemberSummary>,
    pub students: Vec<MemberSummary>,
}

impl ProjectWithMembers {
    /// The member IDs as a membership set.
    #[must_use]
    pub fn membership(&self) -> Membership {
        Membership::from_ids(
            self.supervisors.iter().map(|m| m.id),
            self.students.iter().map(|m| m.id),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn member(id: i32, name: &str) -> MemberSummary {
        MemberSummary {
            id: UserId::new(id),
            full_name: name.to_string(),
            email: Email::parse(&format!("{}@uni.edu", name.to_lowercase())).unwrap(),
        }
    }

    #[test]
    fn test_membership_and_flattened_json() {
        let now = Utc::now();
        let project = ProjectWithMembers {
            project: Project {
                id: ProjectId::new(7),
                name: "Capstone A".to_string(),
                details: String::new(),
                version: 1,
                created_at: now,
                updated_at: now,
            },
            supervisors: vec![member(1, "Sam")],
            students: vec![member(11, "Tess"), member(12, "Theo")],
        };

        let membership = project.membership();
        assert_eq!(membership.supervisors.len(), 1);
        assert_eq!(membership.students.len(), 2);

        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["name"], "Capstone A");
        assert_eq!(json["students"][1]["email"], "theo@uni.edu");
    }
}
