//! Project route handlers.
//!
//! Every signed-in account can list and view the projects in its scope.
//! Administrators and supervisors create and edit; only administrators
//! delete. Create and edit take a JSON body because the member lists are
//! arrays of account ids.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::Redirect,
    routing::get,
};
use serde::Serialize;
use tracing::instrument;

use projectopia_core::ProjectId;
use projectopia_core::input::ProjectForm;

use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireProjectManager, RequireUser};
use crate::models::ProjectWithMembers;
use crate::services::{ProjectFormOptions, ProjectService};
use crate::state::AppState;

const PROJECTS_PATH: &str = "/Project";

/// Build the project router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(PROJECTS_PATH, get(index))
        .route("/Project/Details/{id}", get(details))
        .route("/Project/Create", get(create_page).post(create))
        .route("/Project/Edit/{id}", get(edit_page).post(edit))
        .route("/Project/Delete/{id}", get(delete_page).post(delete))
}

/// Data for the edit form: the current project and every possible member.
#[derive(Debug, Serialize)]
struct EditProjectPage {
    project: ProjectWithMembers,
    options: ProjectFormOptions,
}

/// GET /Project
async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<ProjectWithMembers>>> {
    let projects = ProjectService::new(state.pool())
        .list_for(user.caller())
        .await?;
    Ok(Json(projects))
}

/// GET /Project/Details/{id}
async fn details(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<ProjectId>,
) -> Result<Json<ProjectWithMembers>> {
    let project = ProjectService::new(state.pool())
        .details(user.caller(), id)
        .await?;
    Ok(Json(project))
}

/// GET /Project/Create
async fn create_page(
    State(state): State<AppState>,
    RequireProjectManager(_user): RequireProjectManager,
) -> Result<Json<ProjectFormOptions>> {
    let options = ProjectService::new(state.pool()).form_options().await?;
    Ok(Json(options))
}

/// POST /Project/Create
#[instrument(skip_all)]
async fn create(
    State(state): State<AppState>,
    RequireProjectManager(user): RequireProjectManager,
    Json(form): Json<ProjectForm>,
) -> Result<Redirect> {
    ProjectService::new(state.pool())
        .create(user.caller(), form)
        .await?;
    Ok(Redirect::to(PROJECTS_PATH))
}

/// GET /Project/Edit/{id}
async fn edit_page(
    State(state): State<AppState>,
    RequireProjectManager(user): RequireProjectManager,
    Path(id): Path<ProjectId>,
) -> Result<Json<EditProjectPage>> {
    let service = ProjectService::new(state.pool());
    let project = service.details(user.caller(), id).await?;
    let options = service.form_options().await?;
    Ok(Json(EditProjectPage { project, options }))
}

/// POST /Project/Edit/{id}
#[instrument(skip(state, user, form))]
async fn edit(
    State(state): State<AppState>,
    RequireProjectManager(user): RequireProjectManager,
    Path(id): Path<ProjectId>,
    Json(form): Json<ProjectForm>,
) -> Result<Redirect> {
    ProjectService::new(state.pool())
        .edit(user.caller(), id, form)
        .await?;
    Ok(Redirect::to(PROJECTS_PATH))
}

/// GET /Project/Delete/{id}
async fn delete_page(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProjectId>,
) -> Result<Json<ProjectWithMembers>> {
    let project = ProjectService::new(state.pool())
        .details(admin.caller(), id)
        .await?;
    Ok(Json(project))
}

/// POST /Project/Delete/{id}
///
/// Deleting a project that is already gone still redirects to the list.
#[instrument(skip(state, admin))]
async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProjectId>,
) -> Result<Redirect> {
    ProjectService::new(state.pool())
        .delete(admin.caller(), id)
        .await?;
    Ok(Redirect::to(PROJECTS_PATH))
}
