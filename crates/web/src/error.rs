//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Service errors convert with
//! `?`; server errors are captured to Sentry before the response is built.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use projectopia_core::ValidationErrors;

use crate::db::RepositoryError;
use crate::services::{AuthError, ProjectError, UserError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found, or outside the caller's scope.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Submitted data failed validation.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Stale write that must be resubmitted.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(errors) => Self::Validation(errors),
            AuthError::InvalidCredentials => {
                Self::Unauthorized("Invalid login attempt.".to_string())
            }
            AuthError::LockedOut => Self::Unauthorized("This account has been locked.".to_string()),
            AuthError::UserNotFound => Self::NotFound("user".to_string()),
            AuthError::Repository(e) => Self::Database(e),
            AuthError::PasswordHash => Self::Internal("password hashing error".to_string()),
        }
    }
}

impl From<ProjectError> for AppError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::NotFound => Self::NotFound("project".to_string()),
            ProjectError::Forbidden(reason) => Self::Forbidden(reason.to_string()),
            ProjectError::Validation(errors) => Self::Validation(errors),
            ProjectError::Conflict { .. } => Self::Conflict(err.to_string()),
            ProjectError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => Self::NotFound("user".to_string()),
            UserError::Forbidden => Self::Forbidden(err.to_string()),
            UserError::Validation(errors) => Self::Validation(errors),
            UserError::PasswordHash => Self::Internal(err.to_string()),
            UserError::Repository(e) => Self::Database(e),
        }
    }
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match self {
            Self::Validation(errors) => json!({ "errors": errors }),
            Self::Database(_) | Self::Session(_) | Self::Internal(_) => {
                json!({ "error": "Internal server error" })
            }
            Self::NotFound(_) => json!({ "error": "Not found" }),
            Self::Unauthorized(msg) | Self::Forbidden(msg) | Self::Conflict(msg) => {
                json!({ "error": msg })
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from an account ID.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("project".to_string());
        assert_eq!(err.to_string(), "Not found: project");

        let err = AppError::Conflict("stale".to_string());
        assert_eq!(err.to_string(), "Conflict: stale");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Validation(ValidationErrors::single("name", "required"))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_project_errors_map_to_statuses() {
        assert_eq!(
            get_status(ProjectError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ProjectError::Forbidden("admins only").into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(ProjectError::Conflict { current: 3 }.into()),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_auth_errors_map_to_statuses() {
        assert_eq!(
            get_status(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::LockedOut.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(UserError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
    }
}
