//! Account lifecycle tests against PostgreSQL.
//!
//! Each test runs in its own database with the web migrations applied.

use sqlx::PgPool;

use projectopia_core::Role;
use projectopia_core::input::{ChangePasswordForm, LoginForm, RegistrationForm, UserForm};
use projectopia_integration_tests::{TEST_INVITE_CODE, create_user, project_form};
use projectopia_web::models::RoleData;
use projectopia_web::seed::{SAMPLE_ACCOUNTS, ensure_sample_accounts};
use projectopia_web::services::{AuthError, AuthService, ProjectService, UserError, UserService};

fn user_form(name: &str, email: &str, role: &str) -> UserForm {
    UserForm {
        full_name: name.to_owned(),
        email: email.to_owned(),
        phone: None,
        role: role.to_owned(),
    }
}

fn login(email: &str, password: &str) -> LoginForm {
    LoginForm {
        email: email.to_owned(),
        password: password.to_owned(),
    }
}

#[sqlx::test(migrations = "../web/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_seed_is_idempotent_and_accounts_sign_in(pool: PgPool) {
    assert_eq!(ensure_sample_accounts(&pool).await.unwrap(), 3);
    assert_eq!(ensure_sample_accounts(&pool).await.unwrap(), 0);

    let auth = AuthService::new(&pool);
    for (email, _, role, password) in SAMPLE_ACCOUNTS {
        let user = auth.login(login(email, password)).await.unwrap();
        assert_eq!(user.role, role);
        assert!(!user.must_change_password);
    }

    assert!(matches!(
        auth.login(login("admin@example.com", "wrong")).await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        auth.login(login("nobody@example.com", "Admin@123")).await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[sqlx::test(migrations = "../web/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_registration_rejects_taken_email_case_insensitively(pool: PgPool) {
    let auth = AuthService::new(&pool);
    let form = |email: &str| RegistrationForm {
        full_name: "Tess Student".to_owned(),
        email: email.to_owned(),
        phone: None,
        password: "secret1".to_owned(),
        confirm_password: "secret1".to_owned(),
        role: "Student".to_owned(),
        invite_code: None,
    };

    let user = auth.register(form("tess@uni.edu"), None).await.unwrap();
    assert_eq!(user.role, Role::Student);

    let Err(AuthError::Validation(errors)) = auth.register(form("TESS@uni.edu"), None).await else {
        panic!("expected a taken email");
    };
    assert!(errors.has_field("email"));
}

#[sqlx::test(migrations = "../web/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_admin_registration_with_invite_code(pool: PgPool) {
    let auth = AuthService::new(&pool);
    let form = RegistrationForm {
        full_name: "Ada Admin".to_owned(),
        email: "ada@uni.edu".to_owned(),
        phone: None,
        password: "secret1".to_owned(),
        confirm_password: "secret1".to_owned(),
        role: "Admin".to_owned(),
        invite_code: Some(TEST_INVITE_CODE.to_owned()),
    };

    let user = auth.register(form, Some(TEST_INVITE_CODE)).await.unwrap();
    assert_eq!(user.role, Role::Admin);
}

#[sqlx::test(migrations = "../web/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_created_account_must_change_password(pool: PgPool) {
    let admin = create_user(&pool, "Ada Admin", Role::Admin).await.caller();

    let created = UserService::new(&pool)
        .create_user(
            admin,
            user_form("Tess Student", "tess@uni.edu", "Student"),
            Some("Welcome@1"),
        )
        .await
        .unwrap();
    assert_eq!(created.temporary_password, "Welcome@1");
    assert!(created.user.must_change_password);

    let auth = AuthService::new(&pool);
    let user = auth.login(login("tess@uni.edu", "Welcome@1")).await.unwrap();
    assert!(user.must_change_password);

    auth.change_password(
        user.id,
        ChangePasswordForm {
            current_password: "Welcome@1".to_owned(),
            new_password: "Mine@456".to_owned(),
            confirm_password: "Mine@456".to_owned(),
        },
    )
    .await
    .unwrap();

    let user = auth.login(login("tess@uni.edu", "Mine@456")).await.unwrap();
    assert!(!user.must_change_password);
    assert!(auth.login(login("tess@uni.edu", "Welcome@1")).await.is_err());
}

#[sqlx::test(migrations = "../web/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_toggle_twice_restores_access(pool: PgPool) {
    let admin = create_user(&pool, "Ada Admin", Role::Admin).await.caller();
    let service = UserService::new(&pool);
    let created = service
        .create_user(
            admin,
            user_form("Tess Student", "tess@uni.edu", "Student"),
            Some("Welcome@1"),
        )
        .await
        .unwrap();
    let id = created.user.id;
    let auth = AuthService::new(&pool);

    let locked = service.toggle_active(admin, id).await.unwrap();
    assert!(!locked.is_active());
    assert!(matches!(
        auth.login(login("tess@uni.edu", "Welcome@1")).await,
        Err(AuthError::LockedOut)
    ));

    let unlocked = service.toggle_active(admin, id).await.unwrap();
    assert!(unlocked.is_active());
    assert!(auth.login(login("tess@uni.edu", "Welcome@1")).await.is_ok());
}

#[sqlx::test(migrations = "../web/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_admin_cannot_lock_or_delete_self(pool: PgPool) {
    let admin = create_user(&pool, "Ada Admin", Role::Admin).await.caller();
    let service = UserService::new(&pool);

    assert!(matches!(
        service.toggle_active(admin, admin.id).await,
        Err(UserError::Validation(_))
    ));
    assert!(matches!(
        service.delete_user(admin, admin.id).await,
        Err(UserError::Validation(_))
    ));
}

#[sqlx::test(migrations = "../web/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_admin_cannot_demote_self(pool: PgPool) {
    let ada = create_user(&pool, "Ada Admin", Role::Admin).await;
    let admin = ada.caller();
    let service = UserService::new(&pool);

    let Err(UserError::Validation(errors)) = service
        .edit_user(admin, ada.id, user_form("Ada Admin", ada.email.as_str(), "Student"))
        .await
    else {
        panic!("expected a validation error");
    };
    assert!(errors.has_field("role"));

    let kept = service
        .edit_user(admin, ada.id, user_form("Ada L. Admin", ada.email.as_str(), "Admin"))
        .await
        .unwrap();
    assert_eq!(kept.role, Role::Admin);
    assert_eq!(kept.full_name, "Ada L. Admin");
}

#[sqlx::test(migrations = "../web/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_delete_user_removes_memberships(pool: PgPool) {
    let admin = create_user(&pool, "Ada Admin", Role::Admin).await.caller();
    let sam = create_user(&pool, "Sam Supervisor", Role::Supervisor).await;
    let tess = create_user(&pool, "Tess Student", Role::Student).await;

    let projects = ProjectService::new(&pool);
    let project = projects
        .create(admin, project_form("Capstone A", &[sam.id], &[tess.id]))
        .await
        .unwrap();

    let service = UserService::new(&pool);
    service.delete_user(admin, tess.id).await.unwrap();

    let reloaded = projects.details(admin, project.project.id).await.unwrap();
    assert!(reloaded.students.is_empty());
    assert_eq!(reloaded.supervisors.len(), 1);

    assert!(matches!(
        service.get_user(admin, tess.id).await,
        Err(UserError::NotFound)
    ));
    assert!(matches!(
        service.delete_user(admin, tess.id).await,
        Err(UserError::NotFound)
    ));
}

#[sqlx::test(migrations = "../web/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_role_change_drops_old_memberships(pool: PgPool) {
    let admin = create_user(&pool, "Ada Admin", Role::Admin).await.caller();
    let tess = create_user(&pool, "Tess Student", Role::Student).await;

    let projects = ProjectService::new(&pool);
    let project = projects
        .create(admin, project_form("Capstone A", &[], &[tess.id]))
        .await
        .unwrap();

    let service = UserService::new(&pool);
    let details = service.get_user(admin, tess.id).await.unwrap();
    assert_eq!(
        details.role_data,
        RoleData::Student {
            enrolled: vec![project.project.id]
        }
    );

    let promoted = service
        .edit_user(
            admin,
            tess.id,
            user_form("Tess Student", tess.email.as_str(), "Supervisor"),
        )
        .await
        .unwrap();
    assert_eq!(promoted.role, Role::Supervisor);

    let details = service.get_user(admin, tess.id).await.unwrap();
    assert_eq!(details.role_data, RoleData::Supervisor { supervised: vec![] });
    let reloaded = projects.details(admin, project.project.id).await.unwrap();
    assert!(reloaded.students.is_empty());
}

#[sqlx::test(migrations = "../web/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_non_admin_cannot_manage_accounts(pool: PgPool) {
    let sam = create_user(&pool, "Sam Supervisor", Role::Supervisor).await;
    let service = UserService::new(&pool);

    assert!(matches!(
        service.list_users(sam.caller()).await,
        Err(UserError::Forbidden)
    ));
    assert!(matches!(
        service
            .create_user(sam.caller(), user_form("X", "x@uni.edu", "Student"), None)
            .await,
        Err(UserError::Forbidden)
    ));
}
