//! Authentication extractors.
//!
//! The session only carries the account id. Every extractor reloads the
//! account from the database, so a deleted or locked account is signed out on
//! its next request and a role edit applies immediately.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use projectopia_core::Role;

use crate::db::UserRepository;
use crate::error::set_sentry_user;
use crate::models::{SessionUser, User, session_keys};
use crate::state::AppState;

/// Login page unauthenticated requests are sent to.
pub const LOGIN_PATH: &str = "/Account/Login";

/// Error returned when an extractor rejects the request.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for page requests).
    RedirectToLogin,
    /// Unauthorized response (for `/api/` requests).
    Unauthorized,
    /// Signed in, but the role may not use the resource.
    Forbidden,
    /// The account could not be loaded.
    Internal,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "You do not have access to this resource",
            )
                .into_response(),
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

fn unauthenticated(parts: &Parts) -> AuthRejection {
    if parts.uri.path().starts_with("/api/") {
        AuthRejection::Unauthorized
    } else {
        AuthRejection::RedirectToLogin
    }
}

/// Resolve the signed-in account for this request.
async fn current_user(parts: &Parts, state: &AppState) -> Result<User, AuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::Unauthorized)?;

    let session_user: SessionUser = session
        .get(session_keys::CURRENT_USER)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to read session");
            AuthRejection::Internal
        })?
        .ok_or_else(|| unauthenticated(parts))?;

    let user = UserRepository::new(state.pool())
        .get_by_id(session_user.id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %session_user.id, "Failed to load session account");
            AuthRejection::Internal
        })?;

    match user {
        Some(user) if user.is_active() => {
            set_sentry_user(&user.id, Some(user.email.as_str()));
            Ok(user)
        }
        stale => {
            tracing::info!(
                user_id = %session_user.id,
                deleted = stale.is_none(),
                "Signing out session of unavailable account"
            );
            if let Err(e) = session.flush().await {
                tracing::warn!(error = %e, user_id = %session_user.id, "Failed to flush session");
            }
            Err(unauthenticated(parts))
        }
    }
}

async fn user_with_role(
    parts: &Parts,
    state: &AppState,
    allowed: impl Fn(Role) -> bool,
) -> Result<User, AuthRejection> {
    let user = current_user(parts, state).await?;
    if allowed(user.role) {
        Ok(user)
    } else {
        tracing::debug!(user_id = %user.id, role = %user.role, path = parts.uri.path(), "Role rejected");
        Err(AuthRejection::Forbidden)
    }
}

/// Extractor that requires any signed-in account.
///
/// # Example
///
/// ```rust,ignore
/// async fn me(RequireUser(user): RequireUser) -> impl IntoResponse {
///     Json(user)
/// }
/// ```
pub struct RequireUser(pub User);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        current_user(parts, state).await.map(Self)
    }
}

/// Extractor that requires an administrator.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        user_with_role(parts, state, |role| role == Role::Admin)
            .await
            .map(Self)
    }
}

/// Extractor that requires a supervisor.
pub struct RequireSupervisor(pub User);

impl FromRequestParts<AppState> for RequireSupervisor {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        user_with_role(parts, state, |role| role == Role::Supervisor)
            .await
            .map(Self)
    }
}

/// Extractor that requires a student.
pub struct RequireStudent(pub User);

impl FromRequestParts<AppState> for RequireStudent {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        user_with_role(parts, state, |role| role == Role::Student)
            .await
            .map(Self)
    }
}

/// Extractor that requires an administrator or a supervisor.
pub struct RequireProjectManager(pub User);

impl FromRequestParts<AppState> for RequireProjectManager {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        user_with_role(parts, state, |role| {
            matches!(role, Role::Admin | Role::Supervisor)
        })
        .await
        .map(Self)
    }
}

/// Start an authenticated session for `user`.
///
/// The session id is cycled first so a pre-login id is never reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &User,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_USER, SessionUser { id: user.id })
        .await
}

/// End the authenticated session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_for(path: &str) -> Parts {
        Request::builder().uri(path).body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_unauthenticated_page_redirects() {
        let parts = parts_for("/Project");
        assert!(matches!(
            unauthenticated(&parts),
            AuthRejection::RedirectToLogin
        ));
    }

    #[test]
    fn test_unauthenticated_api_is_401() {
        let parts = parts_for("/api/projects");
        assert!(matches!(
            unauthenticated(&parts),
            AuthRejection::Unauthorized
        ));
    }

    #[test]
    fn test_rejection_responses() {
        let redirect = AuthRejection::RedirectToLogin.into_response();
        assert_eq!(redirect.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            redirect.headers().get("location").map(|v| v.as_bytes()),
            Some(LOGIN_PATH.as_bytes())
        );
        assert_eq!(
            AuthRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
