//! Account route handlers.
//!
//! Password sign-in, self-registration, password changes and logout.

use axum::{
    Form, Json, Router,
    extract::State,
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use projectopia_core::input::{ChangePasswordForm, LoginForm, RegistrationForm};
use projectopia_core::landing_path;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{LOGIN_PATH, RequireUser, clear_current_user, set_current_user};
use crate::models::User;
use crate::services::AuthService;
use crate::state::AppState;

/// Page an account with a temporary password is sent to after sign-in.
pub const CHANGE_PASSWORD_PATH: &str = "/Account/ChangePassword";

/// Build the account router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(LOGIN_PATH, get(login_page).post(login))
        .route("/Account/Register", post(register))
        .route("/Account/Logout", post(logout))
        .route(CHANGE_PASSWORD_PATH, post(change_password))
        .route("/Account/Me", get(me))
}

/// Where a freshly signed-in account goes.
fn after_sign_in(user: &User) -> &'static str {
    if user.must_change_password {
        CHANGE_PASSWORD_PATH
    } else {
        landing_path([user.role])
    }
}

/// GET /Account/Login
async fn login_page() -> impl IntoResponse {
    Json(json!({ "message": "Sign in with your email and password." }))
}

/// POST /Account/Login
#[instrument(skip_all)]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect> {
    let user = AuthService::new(state.pool()).login(form).await?;

    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, role = %user.role, "Signed in");

    Ok(Redirect::to(after_sign_in(&user)))
}

/// POST /Account/Register
#[instrument(skip_all)]
async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegistrationForm>,
) -> Result<Redirect> {
    let user = AuthService::new(state.pool())
        .register(form, state.config().admin_invite_code())
        .await?;

    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok(Redirect::to(after_sign_in(&user)))
}

/// POST /Account/Logout
async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to(LOGIN_PATH))
}

/// POST /Account/ChangePassword
#[instrument(skip_all)]
async fn change_password(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Form(form): Form<ChangePasswordForm>,
) -> Result<Redirect> {
    AuthService::new(state.pool())
        .change_password(user.id, form)
        .await?;

    Ok(Redirect::to(landing_path([user.role])))
}

/// GET /Account/Me
async fn me(RequireUser(user): RequireUser) -> Json<User> {
    Json(user)
}
