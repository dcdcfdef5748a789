//! Account lifecycle managed by administrators.

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use projectopia_core::input::UserForm;
use projectopia_core::{Caller, Role, UserId, ValidationErrors};

use super::auth::{AuthError, generate_temporary_password, hash_password};
use crate::db::{MembershipRepository, RepositoryError, UserRepository, memberships, users};
use crate::models::{RoleData, User, UserSummary};

/// Errors from account management.
#[derive(Debug, Error)]
pub enum UserError {
    /// No account with the requested ID.
    #[error("user not found")]
    NotFound,

    /// Caller's role may not manage accounts.
    #[error("only administrators can manage accounts")]
    Forbidden,

    /// Submitted form failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// Password hashing failed.
    #[error("password hashing failed")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for UserError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

impl From<AuthError> for UserError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(errors) => Self::Validation(errors),
            AuthError::Repository(e) => Self::Repository(e),
            AuthError::UserNotFound => Self::NotFound,
            _ => Self::PasswordHash,
        }
    }
}

/// An account created by an administrator, with the temporary password to
/// hand over. The password is not stored anywhere in clear.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedUser {
    pub user: User,
    pub temporary_password: String,
}

/// An account with the projects it is attached to.
#[derive(Debug, Clone, Serialize)]
pub struct UserDetails {
    pub user: User,
    #[serde(flatten)]
    pub role_data: RoleData,
}

/// Administrator account management.
pub struct UserService<'a> {
    pool: &'a PgPool,
    users: UserRepository<'a>,
    memberships: MembershipRepository<'a>,
}

impl<'a> UserService<'a> {
    /// Create a new user service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            users: UserRepository::new(pool),
            memberships: MembershipRepository::new(pool),
        }
    }

    /// Every account for the admin list.
    ///
    /// # Errors
    ///
    /// Returns `UserError::Forbidden` if the caller is not an administrator.
    pub async fn list_users(&self, caller: Caller) -> Result<Vec<UserSummary>, UserError> {
        ensure_admin(caller)?;
        let users = self.users.list_all().await?;
        Ok(users.iter().map(User::summary).collect())
    }

    /// One account with its memberships.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotFound` if the account does not exist.
    pub async fn get_user(&self, caller: Caller, id: UserId) -> Result<UserDetails, UserError> {
        ensure_admin(caller)?;
        let user = self.users.get_by_id(id).await?.ok_or(UserError::NotFound)?;
        let project_ids = self.memberships.project_ids_for(user.id, user.role).await?;

        let role_data = match user.role {
            Role::Admin => RoleData::Admin,
            Role::Supervisor => RoleData::Supervisor {
                supervised: project_ids,
            },
            Role::Student => RoleData::Student {
                enrolled: project_ids,
            },
        };
        Ok(UserDetails { user, role_data })
    }

    /// Create an account with a temporary password.
    ///
    /// The password is `default_password` when one is configured and a random
    /// one otherwise. The account must change it at first sign-in.
    ///
    /// # Errors
    ///
    /// Returns `UserError::Validation` listing every invalid field, including
    /// an already registered email.
    #[instrument(skip(self, form, default_password), fields(caller = %caller.id))]
    pub async fn create_user(
        &self,
        caller: Caller,
        form: UserForm,
        default_password: Option<&str>,
    ) -> Result<CreatedUser, UserError> {
        ensure_admin(caller)?;
        let profile = form.validate()?;

        let temporary_password =
            default_password.map_or_else(generate_temporary_password, str::to_owned);
        let password_hash = hash_password(&temporary_password)?;

        let mut tx = self.pool.begin().await?;
        let user = users::insert(&mut *tx, &profile, &password_hash, true)
            .await
            .map_err(|e| email_taken(e, profile.email.as_str()))?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, role = %user.role, "Account created");
        Ok(CreatedUser {
            user,
            temporary_password,
        })
    }

    /// Overwrite an account's profile and role.
    ///
    /// When the role changes, every membership the account held under its
    /// previous role is removed in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotFound` if the account does not exist.
    /// Returns `UserError::Validation` listing every invalid field, or if an
    /// administrator tries to give up their own administrator role.
    #[instrument(skip(self, form), fields(caller = %caller.id))]
    pub async fn edit_user(
        &self,
        caller: Caller,
        id: UserId,
        form: UserForm,
    ) -> Result<User, UserError> {
        ensure_admin(caller)?;
        let profile = form.validate()?;
        if id == caller.id && profile.role != Role::Admin {
            return Err(UserError::Validation(ValidationErrors::single(
                "role",
                "You cannot remove your own administrator role.",
            )));
        }

        let mut tx = self.pool.begin().await?;
        let existing = users::lock(&mut *tx, id).await?.ok_or(UserError::NotFound)?;

        let updated = users::update_profile(&mut *tx, id, &profile)
            .await
            .map_err(|e| email_taken(e, profile.email.as_str()))?;

        if existing.role != updated.role {
            let removed = memberships::remove_for_user(&mut *tx, id).await?;
            tracing::info!(
                user_id = %id,
                from = %existing.role,
                to = %updated.role,
                supervised_removed = removed.supervised,
                enrolled_removed = removed.enrolled,
                "Account role changed"
            );
        }
        tx.commit().await?;

        Ok(updated)
    }

    /// Lock an active account or unlock a locked one.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotFound` if the account does not exist.
    /// Returns `UserError::Validation` if an administrator tries to lock their
    /// own account.
    #[instrument(skip(self), fields(caller = %caller.id))]
    pub async fn toggle_active(&self, caller: Caller, id: UserId) -> Result<User, UserError> {
        ensure_admin(caller)?;

        let mut tx = self.pool.begin().await?;
        let user = users::lock(&mut *tx, id).await?.ok_or(UserError::NotFound)?;

        if id == caller.id && user.is_active() {
            return Err(UserError::Validation(ValidationErrors::single(
                "id",
                "You cannot lock your own account.",
            )));
        }

        let lockout = user.lockout.toggled_at(chrono::Utc::now());
        let updated = users::set_lockout(&mut *tx, id, lockout).await?;
        tx.commit().await?;

        tracing::info!(user_id = %id, active = updated.is_active(), "Account status toggled");
        Ok(updated)
    }

    /// Delete an account and every membership referencing it.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotFound` if the account does not exist.
    /// Returns `UserError::Validation` if an administrator tries to delete
    /// their own account.
    #[instrument(skip(self), fields(caller = %caller.id))]
    pub async fn delete_user(&self, caller: Caller, id: UserId) -> Result<(), UserError> {
        ensure_admin(caller)?;
        if id == caller.id {
            return Err(UserError::Validation(ValidationErrors::single(
                "id",
                "You cannot delete your own account.",
            )));
        }

        let mut tx = self.pool.begin().await?;
        if users::lock(&mut *tx, id).await?.is_none() {
            return Err(UserError::NotFound);
        }

        let removed = memberships::remove_for_user(&mut *tx, id).await?;
        users::delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(
            user_id = %id,
            supervised_removed = removed.supervised,
            enrolled_removed = removed.enrolled,
            "Account deleted"
        );
        Ok(())
    }
}

const fn ensure_admin(caller: Caller) -> Result<(), UserError> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(UserError::Forbidden)
    }
}

fn email_taken(e: RepositoryError, email: &str) -> UserError {
    match e {
        RepositoryError::Conflict(_) => UserError::Validation(ValidationErrors::single(
            "email",
            format!("Email '{email}' is already taken."),
        )),
        RepositoryError::NotFound => UserError::NotFound,
        other => UserError::Repository(other),
    }
}
