//! Router tests.
//!
//! These drive the full router with `oneshot` over a pool that never
//! connects. Requests without a session cookie are answered before any query
//! runs; a request carrying one fails at the session store.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use projectopia_integration_tests::lazy_state;
use projectopia_web::app;
use projectopia_web::middleware::SESSION_COOKIE_NAME;

async fn send(request: Request<Body>) -> axum::response::Response {
    let router = app(lazy_state()).expect("router builds");
    router.oneshot(request).await.expect("infallible")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &axum::response::Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn test_health() {
    let response = send(get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_pages_redirect_to_login() {
    for uri in [
        "/Project",
        "/Project/Details/1",
        "/Admin",
        "/Admin/Users",
        "/Supervisor",
        "/Student/MyProjects",
        "/Account/Me",
    ] {
        let response = send(get(uri)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), Some("/Account/Login"), "{uri}");
    }
}

#[tokio::test]
async fn test_login_page_is_public() {
    let response = send(get("/Account/Login")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_reports_every_missing_field() {
    let response = send(post_form("/Account/Login", "email=&password=")).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(response).await;
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
}

#[tokio::test]
async fn test_admin_registration_requires_invite_code() {
    let response = send(post_form(
        "/Account/Register",
        "full_name=Eve&email=eve%40uni.edu&password=secret1&confirm_password=secret1&role=Admin&invite_code=guess",
    ))
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(response).await;
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert_eq!(fields, ["invite_code"]);
}

#[tokio::test]
async fn test_registration_reports_all_errors_at_once() {
    let response = send(post_form(
        "/Account/Register",
        "full_name=&email=nope&password=abc&confirm_password=xyz&role=Student",
    ))
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(response).await;
    assert!(body["errors"].as_array().unwrap().len() >= 3);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let response = send(get("/api/projects")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unreadable_session_is_a_server_error() {
    let cookie = format!(
        "{}={}",
        SESSION_COOKIE_NAME,
        tower_sessions::session::Id::default()
    );
    let request = Request::builder()
        .uri("/Account/Me")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();

    let response = send(request).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
