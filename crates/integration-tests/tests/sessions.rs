//! Signed-in request tests against PostgreSQL.
//!
//! Accounts sign in through the router and the session cookie is replayed on
//! later requests, so account changes made between requests are observed by
//! the extractors.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use sqlx::PgPool;
use tower::ServiceExt;

use projectopia_core::Role;
use projectopia_core::input::UserForm;
use projectopia_integration_tests::{create_user, test_config};
use projectopia_web::app;
use projectopia_web::middleware::SESSION_COOKIE_NAME;
use projectopia_web::services::UserService;
use projectopia_web::state::AppState;

const PASSWORD: &str = "Welcome@1";

fn router(pool: &PgPool) -> Router {
    app(AppState::new(test_config(), pool.clone())).unwrap()
}

fn user_form(name: &str, email: &str, role: &str) -> UserForm {
    UserForm {
        full_name: name.to_owned(),
        email: email.to_owned(),
        phone: None,
        role: role.to_owned(),
    }
}

fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// Sign in and return the `name=value` session cookie.
async fn sign_in(router: &Router, email: &str) -> String {
    let body = format!("email={}&password={PASSWORD}", email.replace('@', "%40"));
    let request = Request::builder()
        .method("POST")
        .uri("/Account/Login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(SESSION_COOKIE_NAME))
        .expect("session cookie");
    cookie.split(';').next().unwrap().to_owned()
}

async fn get(router: &Router, uri: &str, cookie: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    router.clone().oneshot(request).await.unwrap()
}

#[sqlx::test(migrations = "../web/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_locked_account_is_signed_out(pool: PgPool) {
    let admin = create_user(&pool, "Ada Admin", Role::Admin).await.caller();
    let users = UserService::new(&pool);
    let tess = users
        .create_user(admin, user_form("Tess Student", "tess@uni.edu", "Student"), Some(PASSWORD))
        .await
        .unwrap()
        .user;

    let router = router(&pool);
    let cookie = sign_in(&router, "tess@uni.edu").await;
    assert_eq!(get(&router, "/Account/Me", &cookie).await.status(), StatusCode::OK);

    users.toggle_active(admin, tess.id).await.unwrap();
    let response = get(&router, "/Account/Me", &cookie).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/Account/Login"));

    // Unlocking does not revive the flushed session.
    users.toggle_active(admin, tess.id).await.unwrap();
    let response = get(&router, "/Account/Me", &cookie).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/Account/Login"));
}

#[sqlx::test(migrations = "../web/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_deleted_account_is_signed_out(pool: PgPool) {
    let admin = create_user(&pool, "Ada Admin", Role::Admin).await.caller();
    let users = UserService::new(&pool);
    let tess = users
        .create_user(admin, user_form("Tess Student", "tess@uni.edu", "Student"), Some(PASSWORD))
        .await
        .unwrap()
        .user;

    let router = router(&pool);
    let cookie = sign_in(&router, "tess@uni.edu").await;

    users.delete_user(admin, tess.id).await.unwrap();
    let response = get(&router, "/Account/Me", &cookie).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/Account/Login"));
}

#[sqlx::test(migrations = "../web/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_role_change_applies_on_next_request(pool: PgPool) {
    let admin = create_user(&pool, "Ada Admin", Role::Admin).await.caller();
    let users = UserService::new(&pool);
    let sam = users
        .create_user(
            admin,
            user_form("Sam Supervisor", "sam@uni.edu", "Supervisor"),
            Some(PASSWORD),
        )
        .await
        .unwrap()
        .user;

    let router = router(&pool);
    let cookie = sign_in(&router, "sam@uni.edu").await;
    assert_eq!(get(&router, "/Supervisor", &cookie).await.status(), StatusCode::OK);

    users
        .edit_user(admin, sam.id, user_form("Sam Supervisor", "sam@uni.edu", "Student"))
        .await
        .unwrap();

    assert_eq!(
        get(&router, "/Supervisor", &cookie).await.status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(get(&router, "/Student", &cookie).await.status(), StatusCode::OK);
}
