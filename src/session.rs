//! Signed sessions with server-side revocation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::clock::Clock;
use crate::config::Session as SessionConfig;
use crate::crypto::random_hex;
use crate::error::Result;
use crate::token::{Claims, TokenManager};
use crate::user::{User, UserRepository};

const SESSION_ID_LENGTH: usize = 16;

/// Issued session id, as stored.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredSession {
    pub id: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Storage port for issued sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn insert(&self, session: StoredSession) -> Result<()>;

    async fn exists(&self, id: &str) -> Result<bool>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Revoke every session of `user_id`.
    async fn delete_for_user(&self, user_id: i64) -> Result<()>;

    /// Drop sessions expired at `now`. Returns how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// PostgreSQL session repository.
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    /// Create a new [`PgSessionRepository`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn insert(&self, session: StoredSession) -> Result<()> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&session.id)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM sessions WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_for_user(&self, user_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// An authenticated session.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

/// Issue, load and revoke sessions.
#[derive(Clone)]
pub struct SessionManager {
    tokens: TokenManager,
    sessions: Arc<dyn SessionRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl SessionManager {
    /// Create a new [`SessionManager`].
    pub fn new(
        tokens: TokenManager,
        sessions: Arc<dyn SessionRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        Self {
            tokens,
            sessions,
            users,
            clock,
            config,
        }
    }

    fn lifetime(&self, remember: bool) -> Duration {
        if remember {
            Duration::days(self.config.remember_days)
        } else {
            Duration::hours(self.config.expiration_hours)
        }
    }

    /// Sign a token for `user` and persist its session id.
    pub async fn issue(&self, user: &User, remember: bool) -> Result<Session> {
        let now = self.clock.now();
        let expires_at = now + self.lifetime(remember);
        let claims = Claims::new(user, random_hex(SESSION_ID_LENGTH), now, expires_at);
        let token = self.tokens.create(&claims)?;

        let purged = self.sessions.purge_expired(now).await?;
        if purged > 0 {
            tracing::debug!(purged, "expired sessions removed");
        }

        self.sessions
            .insert(StoredSession {
                id: claims.jti,
                user_id: user.id,
                created_at: now,
                expires_at,
            })
            .await?;

        Ok(Session {
            token,
            user: user.clone(),
            expires_at,
        })
    }

    /// Resolve `token` into a live session.
    ///
    /// Expired sessions are removed from the store. Bad signatures,
    /// revoked ids and deactivated users all yield `None`.
    pub async fn load(&self, token: &str) -> Result<Option<Session>> {
        let Ok(claims) = self.tokens.decode(token) else {
            return Ok(None);
        };
        let (Some(user_id), Some(expires_at)) = (claims.user_id(), claims.expires_at()) else {
            return Ok(None);
        };

        if self.clock.now() >= expires_at {
            self.sessions.delete(&claims.jti).await?;
            tracing::debug!(user_id, "session expired");
            return Ok(None);
        }

        if !self.sessions.exists(&claims.jti).await? {
            return Ok(None);
        }

        match self.users.find_by_id(user_id).await? {
            Some(user) if user.active => Ok(Some(Session {
                token: token.to_owned(),
                user,
                expires_at,
            })),
            _ => {
                self.sessions.delete(&claims.jti).await?;
                Ok(None)
            },
        }
    }

    pub async fn is_valid(&self, token: &str) -> Result<bool> {
        Ok(self.load(token).await?.is_some())
    }

    /// Revoke the session behind `token`, if any.
    pub async fn clear(&self, token: &str) -> Result<()> {
        if let Ok(claims) = self.tokens.decode(token) {
            self.sessions.delete(&claims.jti).await?;
        }
        Ok(())
    }

    /// Revoke every session of `user_id`.
    pub async fn revoke_user(&self, user_id: i64) -> Result<()> {
        self.sessions.delete_for_user(user_id).await
    }
}
