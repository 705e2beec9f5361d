//! Handle database requests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::error::{Result, ServerError};
use crate::user::User;

/// Storage port for [`User`].
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert [`User`] and return it with its assigned `id`.
    async fn insert(&self, user: User) -> Result<User>;

    /// Find a user, deactivated or not, by `id`.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Find a user, deactivated or not, by `username`.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Active users ordered by display name.
    async fn list_active(&self) -> Result<Vec<User>>;

    /// Persist every mutable field of [`User`].
    async fn update(&self, user: &User) -> Result<()>;

    /// Whether `username` is taken by another user than `excluding`.
    async fn username_exists(
        &self,
        username: &str,
        excluding: Option<i64>,
    ) -> Result<bool>;

    /// Whether display `name` is held by another user than `excluding`,
    /// ignoring case. Deactivated users keep their name.
    async fn name_exists(&self, name: &str, excluding: Option<i64>) -> Result<bool>;
}

/// User record as stored in the database.
#[derive(Debug, Clone, FromRow)]
struct UserRecord {
    id: i64,
    username: String,
    name: String,
    role: String,
    department: String,
    password_hash: String,
    email: Option<String>,
    avatar: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    last_login: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
    deleted_by: Option<String>,
}

impl TryFrom<UserRecord> for User {
    type Error = ServerError;

    fn try_from(record: UserRecord) -> Result<Self> {
        Ok(User {
            id: record.id,
            username: record.username,
            name: record.name,
            role: record.role.parse().map_err(|details| ServerError::Internal {
                details,
                source: None,
            })?,
            department: record.department,
            password_hash: record.password_hash,
            email: record.email,
            avatar: record.avatar,
            active: record.active,
            created_at: record.created_at,
            updated_at: record.updated_at,
            last_login: record.last_login,
            deleted_at: record.deleted_at,
            deleted_by: record.deleted_by,
        })
    }
}

const USER_COLUMNS: &str = r#"id, username, name, role, department, password_hash, email,
    avatar, active, created_at, updated_at, last_login, deleted_at, deleted_by"#;

/// PostgreSQL user repository.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new [`PgUserRepository`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: User) -> Result<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r#"INSERT INTO users (username, name, role, department, password_hash, email, avatar, active, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING {USER_COLUMNS}"#
        ))
        .bind(&user.username)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(&user.department)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(&user.avatar)
        .bind(user.active)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await?;

        record.try_into()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn list_active(&self) -> Result<Vec<User>> {
        sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE active ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect()
    }

    async fn update(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"UPDATE users
                SET name = $2, role = $3, department = $4, password_hash = $5, email = $6,
                    avatar = $7, active = $8, updated_at = $9, last_login = $10,
                    deleted_at = $11, deleted_by = $12
                WHERE id = $1"#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(&user.department)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(&user.avatar)
        .bind(user.active)
        .bind(user.updated_at)
        .bind(user.last_login)
        .bind(user.deleted_at)
        .bind(&user.deleted_by)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn username_exists(
        &self,
        username: &str,
        excluding: Option<i64>,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND ($2::BIGINT IS NULL OR id <> $2))"#,
        )
        .bind(username)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn name_exists(&self, name: &str, excluding: Option<i64>) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT 1 FROM users WHERE lower(name) = lower($1) AND ($2::BIGINT IS NULL OR id <> $2))"#,
        )
        .bind(name)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
