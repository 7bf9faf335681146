//! Persistence seam for user accounts.
//!
//! Handlers only see the [`UserRepository`] trait; production wires in
//! [`PgUserRepository`], tests supply in-memory doubles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::User;
use sqlx::PgPool;
use std::fmt;
use thiserror::Error;
use tracing::instrument;

use crate::db::bootstrap;

/// Errors surfaced by a [`UserRepository`].
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The storage layer's uniqueness constraint on `user_name` fired.
    #[error("user name already exists")]
    DuplicateUserName,
    /// Any other database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A stored user row, including the password hash.
#[derive(Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserRecord {
    /// Storage-assigned id.
    pub id: i64,
    /// Unique login name.
    pub user_name: String,
    /// Display name.
    pub full_name: String,
    /// Argon2 PHC string, never the plain password.
    pub password: String,
    /// `None` when registered without one.
    pub nickname: Option<String>,
    /// Registration time.
    pub date_created: DateTime<Utc>,
}

impl UserRecord {
    /// Public projection of the record: drops the password and normalizes a
    /// missing nickname to an empty string.
    #[must_use]
    pub fn serialize(&self) -> User {
        User {
            id: self.id,
            user_name: self.user_name.clone(),
            full_name: self.full_name.clone(),
            nickname: self.nickname.clone().unwrap_or_default(),
            date_created: self.date_created,
        }
    }
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("user_name", &self.user_name)
            .field("full_name", &self.full_name)
            .field("nickname", &self.nickname)
            .field("date_created", &self.date_created)
            .finish_non_exhaustive()
    }
}

/// Values for a row about to be inserted. `id` is assigned by storage.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Unique login name.
    pub user_name: String,
    /// Display name.
    pub full_name: String,
    /// Argon2 PHC string for the `password` column.
    pub password_hash: String,
    /// Empty nicknames are stored as `None`.
    pub nickname: Option<String>,
    /// Registration time.
    pub date_created: DateTime<Utc>,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("user_name", &self.user_name)
            .field("full_name", &self.full_name)
            .field("nickname", &self.nickname)
            .field("date_created", &self.date_created)
            .finish_non_exhaustive()
    }
}

/// User storage used by the handlers and the bearer guard.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Whether any user already holds `user_name`.
    async fn has_user_with_user_name(&self, user_name: &str) -> Result<bool, RepositoryError>;

    /// Insert a user and return the stored row.
    ///
    /// Implementations must report a uniqueness violation on `user_name` as
    /// [`RepositoryError::DuplicateUserName`].
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, RepositoryError>;

    /// The user holding `user_name`, if any. Matching is exact.
    async fn find_by_user_name(&self, user_name: &str)
    -> Result<Option<UserRecord>, RepositoryError>;

    /// The user with the given id, if any.
    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, RepositoryError>;

    /// Cheap round trip used by the readiness probe.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

const USER_COLUMNS: &str = "id, user_name, full_name, password, nickname, date_created";

/// Postgres-backed repository over the `users` table.
#[derive(Clone, Debug)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Repository over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn has_user_with_user_name(&self, user_name: &str) -> Result<bool, RepositoryError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE user_name = $1)")
                .bind(user_name)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    #[instrument(skip(self, user), fields(user_name = %user.user_name))]
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, RepositoryError> {
        let sql = format!(
            "INSERT INTO users (user_name, full_name, password, nickname, date_created)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(&user.user_name)
            .bind(&user.full_name)
            .bind(&user.password_hash)
            .bind(&user.nickname)
            .bind(user.date_created)
            .fetch_one(&self.pool)
            .await
            .map_err(map_insert_error)
    }

    #[instrument(skip(self))]
    async fn find_by_user_name(
        &self,
        user_name: &str,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_name = $1");
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        bootstrap::ensure_liveness(&self.pool).await?;
        Ok(())
    }
}

fn map_insert_error(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            RepositoryError::DuplicateUserName
        }
        _ => RepositoryError::Database(err),
    }
}
