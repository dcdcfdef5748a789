//! Desired project memberships.
//!
//! A [`Membership`] is the normalized form of a submitted supervisor/student
//! selection: duplicates collapse and IDs come out in ascending order.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Supervisor and student sets of one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub supervisors: BTreeSet<UserId>,
    pub students: BTreeSet<UserId>,
}

impl Membership {
    /// Build a membership from raw ID lists, dropping duplicates.
    pub fn from_ids<S, T>(supervisors: S, students: T) -> Self
    where
        S: IntoIterator<Item = UserId>,
        T: IntoIterator<Item = UserId>,
    {
        Self {
            supervisors: supervisors.into_iter().collect(),
            students: students.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.supervisors.is_empty() && self.students.is_empty()
    }

    /// Ensure `supervisor` is one of the supervisors.
    pub fn include_supervisor(&mut self, supervisor: UserId) {
        self.supervisors.insert(supervisor);
    }

    /// What changes when moving from `self` to `desired`.
    #[must_use]
    pub fn diff(&self, desired: &Self) -> MembershipChanges {
        MembershipChanges {
            supervisors_added: desired.supervisors.difference(&self.supervisors).copied().collect(),
            supervisors_removed: self.supervisors.difference(&desired.supervisors).copied().collect(),
            students_added: desired.students.difference(&self.students).copied().collect(),
            students_removed: self.students.difference(&desired.students).copied().collect(),
        }
    }
}

/// Additions and removals between two memberships.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MembershipChanges {
    pub supervisors_added: Vec<UserId>,
    pub supervisors_removed: Vec<UserId>,
    pub students_added: Vec<UserId>,
    pub students_removed: Vec<UserId>,
}

impl MembershipChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.supervisors_added.is_empty()
            && self.supervisors_removed.is_empty()
            && self.students_added.is_empty()
            && self.students_removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[i32]) -> Vec<UserId> {
        raw.iter().copied().map(UserId::new).collect()
    }

    #[test]
    fn test_from_ids_deduplicates_and_sorts() {
        let m = Membership::from_ids(ids(&[3, 1, 3]), ids(&[7, 7, 5]));
        assert_eq!(m.supervisors.into_iter().collect::<Vec<_>>(), ids(&[1, 3]));
        assert_eq!(m.students.into_iter().collect::<Vec<_>>(), ids(&[5, 7]));
    }

    #[test]
    fn test_diff_capstone_edit() {
        // S1=1, S2=2; T1=11, T2=12
        let current = Membership::from_ids(ids(&[1]), ids(&[11, 12]));
        let desired = Membership::from_ids(ids(&[2]), ids(&[12]));
        let changes = current.diff(&desired);

        assert_eq!(changes.supervisors_added, ids(&[2]));
        assert_eq!(changes.supervisors_removed, ids(&[1]));
        assert!(changes.students_added.is_empty());
        assert_eq!(changes.students_removed, ids(&[11]));
    }

    #[test]
    fn test_diff_identical_is_empty() {
        let m = Membership::from_ids(ids(&[1, 2]), ids(&[3]));
        assert!(m.diff(&m.clone()).is_empty());
        assert!(Membership::default().is_empty());
    }

    #[test]
    fn test_include_supervisor_is_idempotent() {
        let mut m = Membership::from_ids(ids(&[4]), []);
        m.include_supervisor(UserId::new(4));
        m.include_supervisor(UserId::new(9));
        assert_eq!(m.supervisors.len(), 2);
    }
}
