//! Student route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use projectopia_core::ProjectId;

use crate::error::Result;
use crate::middleware::RequireStudent;
use crate::models::{MemberSummary, ProjectWithMembers};
use crate::services::{DashboardService, ProjectService, StudentDashboard};
use crate::state::AppState;

/// Build the student router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/Student", get(dashboard))
        .route("/Student/MyProjects", get(my_projects))
        .route("/Student/ProjectDetails/{id}", get(project_details))
        .route("/Student/Supervisors", get(supervisors))
}

/// GET /Student
async fn dashboard(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
) -> Result<Json<StudentDashboard>> {
    let dashboard = DashboardService::new(state.pool())
        .student(user.caller())
        .await?;
    Ok(Json(dashboard))
}

/// GET /Student/MyProjects
async fn my_projects(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
) -> Result<Json<Vec<ProjectWithMembers>>> {
    let projects = ProjectService::new(state.pool())
        .list_for(user.caller())
        .await?;
    Ok(Json(projects))
}

/// GET /Student/ProjectDetails/{id}
async fn project_details(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
    Path(id): Path<ProjectId>,
) -> Result<Json<ProjectWithMembers>> {
    let project = ProjectService::new(state.pool())
        .details(user.caller(), id)
        .await?;
    Ok(Json(project))
}

/// GET /Student/Supervisors
async fn supervisors(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
) -> Result<Json<Vec<MemberSummary>>> {
    let supervisors = ProjectService::new(state.pool())
        .supervisors_of_student(user.caller())
        .await?;
    Ok(Json(supervisors))
}
