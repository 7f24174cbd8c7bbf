//! Server-side session storage.
//!
//! The cookie only carries an opaque token; the state lives in the `sessions`
//! table. Renewing or purging a session deletes the old row, so a cookie
//! captured before logout no longer resolves to anything.

use std::collections::HashMap;

use actix_session::storage::{LoadError, SaveError, SessionKey, SessionStore, UpdateError};
use actix_web::cookie::time::Duration;
use chrono::{DateTime, TimeDelta, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::RepositoryError;

pub type SessionState = HashMap<String, String>;

#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Removes rows whose expiry has passed. Returns how many were removed.
    pub async fn delete_expired(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expiry <= $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert(&self, data: String, expiry: DateTime<Utc>) -> Result<SessionKey, anyhow::Error> {
        let key = generate_session_key()?;
        sqlx::query("INSERT INTO sessions (token, data, expiry) VALUES ($1, $2, $3)")
            .bind(token(&key))
            .bind(data)
            .bind(expiry)
            .execute(&self.pool)
            .await?;
        Ok(key)
    }
}

impl SessionStore for PgSessionStore {
    async fn load(&self, session_key: &SessionKey) -> Result<Option<SessionState>, LoadError> {
        let row = sqlx::query("SELECT data FROM sessions WHERE token = $1 AND expiry > $2")
            .bind(token(session_key))
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| LoadError::Other(anyhow::Error::new(err)))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let data: String = row
            .try_get("data")
            .map_err(|err| LoadError::Other(anyhow::Error::new(err)))?;
        let state = serde_json::from_str(&data)
            .map_err(|err| LoadError::Deserialization(anyhow::Error::new(err)))?;
        Ok(Some(state))
    }

    async fn save(
        &self,
        session_state: SessionState,
        ttl: &Duration,
    ) -> Result<SessionKey, SaveError> {
        let data = serde_json::to_string(&session_state)
            .map_err(|err| SaveError::Serialization(anyhow::Error::new(err)))?;
        let expiry = expiry_after(ttl).map_err(SaveError::Other)?;
        self.insert(data, expiry).await.map_err(SaveError::Other)
    }

    async fn update(
        &self,
        session_key: SessionKey,
        session_state: SessionState,
        ttl: &Duration,
    ) -> Result<SessionKey, UpdateError> {
        let data = serde_json::to_string(&session_state)
            .map_err(|err| UpdateError::Serialization(anyhow::Error::new(err)))?;
        let expiry = expiry_after(ttl).map_err(UpdateError::Other)?;

        let result = sqlx::query("UPDATE sessions SET data = $2, expiry = $3 WHERE token = $1")
            .bind(token(&session_key))
            .bind(data.as_str())
            .bind(expiry)
            .execute(&self.pool)
            .await
            .map_err(|err| UpdateError::Other(anyhow::Error::new(err)))?;

        if result.rows_affected() > 0 {
            return Ok(session_key);
        }
        // The row expired or was deleted in the meantime.
        self.insert(data, expiry).await.map_err(UpdateError::Other)
    }

    async fn update_ttl(&self, session_key: &SessionKey, ttl: &Duration) -> Result<(), anyhow::Error> {
        sqlx::query("UPDATE sessions SET expiry = $2 WHERE token = $1")
            .bind(token(session_key))
            .bind(expiry_after(ttl)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, session_key: &SessionKey) -> Result<(), anyhow::Error> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token(session_key))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub(crate) fn token(key: &SessionKey) -> &str {
    key.as_ref()
}

/// 64 hex characters from two v4 UUIDs.
pub(crate) fn generate_session_key() -> Result<SessionKey, anyhow::Error> {
    let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    SessionKey::try_from(token).map_err(|err| anyhow::anyhow!("{err}"))
}

pub(crate) fn expiry_after(ttl: &Duration) -> Result<DateTime<Utc>, anyhow::Error> {
    TimeDelta::try_seconds(ttl.whole_seconds())
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| anyhow::anyhow!("session ttl out of range: {ttl}"))
}
