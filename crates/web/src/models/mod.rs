//! Domain models for the web server.
//!
//! These are validated domain objects built from database rows. Row types
//! stay private to the repositories in [`crate::db`].

pub mod project;
pub mod session;
pub mod user;

pub use project::{MemberSummary, Project, ProjectWithMembers};
pub use session::{SessionUser, keys as session_keys};
pub use user::{RoleData, User, UserSummary};
