//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness check
//! GET  /health/ready                   - Readiness check (database)
//!
//! # Account
//! GET  /Account/Login                  - Sign-in hint
//! POST /Account/Login                  - Password sign-in (form)
//! POST /Account/Register               - Self-registration (form)
//! POST /Account/Logout                 - Logout
//! POST /Account/ChangePassword         - Change password (form)
//! GET  /Account/Me                     - Signed-in account
//!
//! # Admin (administrators only)
//! GET  /Admin                          - Dashboard totals
//! GET  /Admin/Users                    - Account list
//! GET  /Admin/CreateUser               - Role choices
//! POST /Admin/CreateUser               - Create account with temporary password
//! GET  /Admin/EditUser/{id}            - Account with memberships
//! POST /Admin/EditUser/{id}            - Update account
//! POST /Admin/ToggleUserStatus/{id}    - Lock/unlock account
//! GET  /Admin/DeleteUser/{id}          - Delete preview
//! POST /Admin/DeleteUser/{id}          - Delete account
//!
//! # Projects (scoped to the caller)
//! GET  /Project                        - Visible projects
//! GET  /Project/Details/{id}           - One visible project
//! GET  /Project/Create                 - Member choices (admin, supervisor)
//! POST /Project/Create                 - Create project (JSON)
//! GET  /Project/Edit/{id}              - Project and member choices
//! POST /Project/Edit/{id}              - Edit project (JSON, versioned)
//! GET  /Project/Delete/{id}            - Delete preview (admin)
//! POST /Project/Delete/{id}            - Delete project (admin)
//!
//! # Supervisor
//! GET  /Supervisor                     - Dashboard
//! GET  /Supervisor/MyProjects          - Supervised projects
//! GET  /Supervisor/ProjectDetails/{id} - One supervised project
//! GET  /Supervisor/Students            - Students across supervised projects
//!
//! # Student
//! GET  /Student                        - Dashboard
//! GET  /Student/MyProjects             - Enrolled projects
//! GET  /Student/ProjectDetails/{id}    - One enrolled project
//! GET  /Student/Supervisors            - Supervisors across enrolled projects
//! ```

pub mod account;
pub mod admin;
pub mod health;
pub mod projects;
pub mod student;
pub mod supervisor;

use axum::Router;

use crate::state::AppState;

/// Every route of the application.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(account::router())
        .merge(admin::router())
        .merge(projects::router())
        .merge(supervisor::router())
        .merge(student::router())
}
