//! Supervisor route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use projectopia_core::ProjectId;

use crate::error::Result;
use crate::middleware::RequireSupervisor;
use crate::models::{MemberSummary, ProjectWithMembers};
use crate::services::{DashboardService, ProjectService, SupervisorDashboard};
use crate::state::AppState;

/// Build the supervisor router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/Supervisor", get(dashboard))
        .route("/Supervisor/MyProjects", get(my_projects))
        .route("/Supervisor/ProjectDetails/{id}", get(project_details))
        .route("/Supervisor/Students", get(students))
}

/// GET /Supervisor
async fn dashboard(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
) -> Result<Json<SupervisorDashboard>> {
    let dashboard = DashboardService::new(state.pool())
        .supervisor(user.caller())
        .await?;
    Ok(Json(dashboard))
}

/// GET /Supervisor/MyProjects
async fn my_projects(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
) -> Result<Json<Vec<ProjectWithMembers>>> {
    let projects = ProjectService::new(state.pool())
        .list_for(user.caller())
        .await?;
    Ok(Json(projects))
}

/// GET /Supervisor/ProjectDetails/{id}
async fn project_details(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
    Path(id): Path<ProjectId>,
) -> Result<Json<ProjectWithMembers>> {
    let project = ProjectService::new(state.pool())
        .details(user.caller(), id)
        .await?;
    Ok(Json(project))
}

/// GET /Supervisor/Students
async fn students(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
) -> Result<Json<Vec<MemberSummary>>> {
    let students = ProjectService::new(state.pool())
        .students_of_supervisor(user.caller())
        .await?;
    Ok(Json(students))
}
