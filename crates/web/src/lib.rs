//! Projectopia web server library.
//!
//! The role-gated project tracker as a library, so the router can be driven
//! from integration tests and the CLI can reuse the repositories.
//!
//! # Layers
//!
//! - [`routes`] - axum handlers; extract the caller and call a service
//! - [`services`] - transactions, access checks and membership reconciliation
//! - [`db`] - sqlx repositories over the `projectopia` schema
//! - [`middleware`] - sessions and the role extractors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use middleware::{SessionStoreError, create_session_layer};
use state::AppState;

/// Build the application router with sessions, request tracing and Sentry.
///
/// # Errors
///
/// Returns an error if the session store cannot be configured.
pub fn app(state: AppState) -> Result<Router, SessionStoreError> {
    let session_layer = create_session_layer(state.pool(), state.config())?;

    Ok(routes::routes()
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction()))
}
