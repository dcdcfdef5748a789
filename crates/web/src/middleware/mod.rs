//! HTTP middleware.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request spans with method, uri, status, latency)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Authorization is done per handler through the extractors in [`auth`].

pub mod auth;
pub mod session;

pub use auth::{
    AuthRejection, LOGIN_PATH, RequireAdmin, RequireProjectManager, RequireStudent,
    RequireSupervisor, RequireUser, clear_current_user, set_current_user,
};
pub use session::{SESSION_COOKIE_NAME, SessionStoreError, create_session_layer};
