//! Administrator route handlers: dashboard and account management.

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
};
use serde::Serialize;
use tracing::instrument;

use projectopia_core::input::UserForm;
use projectopia_core::{Role, UserId};

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::UserSummary;
use crate::services::{AdminDashboard, CreatedUser, DashboardService, UserDetails, UserService};
use crate::state::AppState;

const USERS_PATH: &str = "/Admin/Users";

/// Build the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/Admin", get(dashboard))
        .route(USERS_PATH, get(users))
        .route("/Admin/CreateUser", get(create_user_page).post(create_user))
        .route("/Admin/EditUser/{id}", get(user_details).post(edit_user))
        .route("/Admin/ToggleUserStatus/{id}", post(toggle_user_status))
        .route("/Admin/DeleteUser/{id}", get(user_details).post(delete_user))
}

/// Choices for the create-user form.
#[derive(Debug, Serialize)]
struct CreateUserPage {
    roles: [Role; 3],
}

/// GET /Admin
async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<AdminDashboard>> {
    let dashboard = DashboardService::new(state.pool())
        .admin(admin.caller())
        .await?;
    Ok(Json(dashboard))
}

/// GET /Admin/Users
async fn users(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<UserSummary>>> {
    let users = UserService::new(state.pool())
        .list_users(admin.caller())
        .await?;
    Ok(Json(users))
}

/// GET /Admin/CreateUser
async fn create_user_page(RequireAdmin(_admin): RequireAdmin) -> Json<CreateUserPage> {
    Json(CreateUserPage { roles: Role::ALL })
}

/// POST /Admin/CreateUser
///
/// Responds with the new account and its temporary password, which is not
/// retrievable afterwards.
#[instrument(skip_all)]
async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Form(form): Form<UserForm>,
) -> Result<(StatusCode, Json<CreatedUser>)> {
    let created = UserService::new(state.pool())
        .create_user(admin.caller(), form, state.config().default_password())
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /Admin/EditUser/{id} and GET /Admin/DeleteUser/{id}
async fn user_details(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Json<UserDetails>> {
    let details = UserService::new(state.pool())
        .get_user(admin.caller(), id)
        .await?;
    Ok(Json(details))
}

/// POST /Admin/EditUser/{id}
#[instrument(skip(state, admin, form))]
async fn edit_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
    Form(form): Form<UserForm>,
) -> Result<Redirect> {
    UserService::new(state.pool())
        .edit_user(admin.caller(), id, form)
        .await?;
    Ok(Redirect::to(USERS_PATH))
}

/// POST /Admin/ToggleUserStatus/{id}
#[instrument(skip(state, admin))]
async fn toggle_user_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Redirect> {
    UserService::new(state.pool())
        .toggle_active(admin.caller(), id)
        .await?;
    Ok(Redirect::to(USERS_PATH))
}

/// POST /Admin/DeleteUser/{id}
#[instrument(skip(state, admin))]
async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Redirect> {
    UserService::new(state.pool())
        .delete_user(admin.caller(), id)
        .await?;
    Ok(Redirect::to(USERS_PATH))
}
