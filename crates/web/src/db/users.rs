//! Account repository (the identity store).

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use projectopia_core::input::UserProfile;
use projectopia_core::{Email, Lockout, Role, UserId};

use super::RepositoryError;
use crate::models::{MemberSummary, User};

const USER_COLUMNS: &str = "id, full_name, email, phone, role, must_change_password, \
                            lockout_end, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    full_name: String,
    email: String,
    phone: Option<String>,
    role: Role,
    must_change_password: bool,
    lockout_end: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            full_name: row.full_name,
            email,
            phone: row.phone,
            role: row.role,
            lockout: Lockout::from_end(row.lockout_end),
            must_change_password: row.must_change_password,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MemberRow {
    pub(crate) id: i32,
    pub(crate) full_name: String,
    pub(crate) email: String,
}

impl TryFrom<MemberRow> for MemberSummary {
    type Error = RepositoryError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            id: UserId::new(row.id),
            full_name: row.full_name,
            email,
        })
    }
}

/// Account totals shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct RoleCounts {
    pub total: i64,
    pub admins: i64,
    pub supervisors: i64,
    pub students: i64,
}

fn map_unique_violation(e: sqlx::Error, email: &Email) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("email {email} is already registered"));
    }
    RepositoryError::Database(e)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for account reads.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all accounts ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM projectopia.users ORDER BY full_name, id"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM projectopia.users WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get an account by email (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM projectopia.users WHERE lower(email) = lower($1)"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get an account together with its password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<UserWithHashRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM projectopia.users \
             WHERE lower(email) = lower($1)"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| {
            let user = User::try_from(r.user)?;
            Ok((user, r.password_hash))
        })
        .transpose()
    }

    /// Get the password hash of an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<String>, RepositoryError> {
        let hash: Option<(String,)> =
            sqlx::query_as("SELECT password_hash FROM projectopia.users WHERE id = $1")
                .bind(id.as_i32())
                .fetch_optional(self.pool)
                .await?;

        Ok(hash.map(|(h,)| h))
    }

    /// All accounts holding `role`, as member summaries ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_members_by_role(
        &self,
        role: Role,
    ) -> Result<Vec<MemberSummary>, RepositoryError> {
        let rows: Vec<MemberRow> = sqlx::query_as(
            r"
            SELECT id, full_name, email
            FROM projectopia.users
            WHERE role = $1
            ORDER BY full_name, id
            ",
        )
        .bind(role)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Account totals per role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_role(&self) -> Result<RoleCounts, RepositoryError> {
        let counts: RoleCounts = sqlx::query_as(
            r"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE role = 'admin') AS admins,
                   COUNT(*) FILTER (WHERE role = 'supervisor') AS supervisors,
                   COUNT(*) FILTER (WHERE role = 'student') AS students
            FROM projectopia.users
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(counts)
    }

    /// Replace an account's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, password_hash))]
    pub async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
        must_change_password: bool,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE projectopia.users
            SET password_hash = $2, must_change_password = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .bind(password_hash)
        .bind(must_change_password)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

// =============================================================================
// Transactional writes
// =============================================================================

/// Insert an account.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the email is already registered.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn insert(
    conn: &mut PgConnection,
    profile: &UserProfile,
    password_hash: &str,
    must_change_password: bool,
) -> Result<User, RepositoryError> {
    let row: UserRow = sqlx::query_as(&format!(
        r"
        INSERT INTO projectopia.users
            (full_name, email, phone, role, password_hash, must_change_password)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {USER_COLUMNS}
        "
    ))
    .bind(&profile.full_name)
    .bind(profile.email.as_str())
    .bind(profile.phone.as_deref())
    .bind(profile.role)
    .bind(password_hash)
    .bind(must_change_password)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| map_unique_violation(e, &profile.email))?;

    row.try_into()
}

/// Load an account and lock its row for the rest of the transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if the data is invalid.
pub async fn lock(conn: &mut PgConnection, id: UserId) -> Result<Option<User>, RepositoryError> {
    let row: Option<UserRow> = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM projectopia.users WHERE id = $1 FOR UPDATE"
    ))
    .bind(id.as_i32())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(TryInto::try_into).transpose()
}

/// Overwrite an account's profile and role.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the account does not exist.
/// Returns `RepositoryError::Conflict` if the new email is already registered.
pub async fn update_profile(
    conn: &mut PgConnection,
    id: UserId,
    profile: &UserProfile,
) -> Result<User, RepositoryError> {
    let row: Option<UserRow> = sqlx::query_as(&format!(
        r"
        UPDATE projectopia.users
        SET full_name = $2, email = $3, phone = $4, role = $5, updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "
    ))
    .bind(id.as_i32())
    .bind(&profile.full_name)
    .bind(profile.email.as_str())
    .bind(profile.phone.as_deref())
    .bind(profile.role)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| map_unique_violation(e, &profile.email))?;

    row.ok_or(RepositoryError::NotFound)?.try_into()
}

/// Store a new lockout state.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the account does not exist.
/// Returns `RepositoryError::Database` if the query fails.
pub async fn set_lockout(
    conn: &mut PgConnection,
    id: UserId,
    lockout: Lockout,
) -> Result<User, RepositoryError> {
    let row: Option<UserRow> = sqlx::query_as(&format!(
        r"
        UPDATE projectopia.users
        SET lockout_end = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "
    ))
    .bind(id.as_i32())
    .bind(lockout.end())
    .fetch_optional(&mut *conn)
    .await?;

    row.ok_or(RepositoryError::NotFound)?.try_into()
}

/// Delete an account. Returns whether a row was removed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn delete(conn: &mut PgConnection, id: UserId) -> Result<bool, RepositoryError> {
    let result = sqlx::query("DELETE FROM projectopia.users WHERE id = $1")
        .bind(id.as_i32())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}
