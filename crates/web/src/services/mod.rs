//! Business logic services.
//!
//! Services borrow the pool, open their own transactions for writes and
//! return a per-service error that converts into
//! [`AppError`](crate::error::AppError).
//!
//! # Services
//!
//! - `auth` - Registration, password sign-in and password changes
//! - `dashboard` - Per-role dashboard summaries
//! - `membership` - Project membership reconciler
//! - `projects` - Scoped project reads and project mutations
//! - `users` - Administrator account lifecycle

pub mod auth;
pub mod dashboard;
pub mod membership;
pub mod projects;
pub mod users;

pub use auth::{AuthError, AuthService};
pub use dashboard::{AdminDashboard, DashboardService, StudentDashboard, SupervisorDashboard};
pub use projects::{ProjectError, ProjectFormOptions, ProjectService};
pub use users::{CreatedUser, UserDetails, UserError, UserService};
