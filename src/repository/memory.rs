//! In-memory repositories for tests and local experiments without PostgreSQL.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use actix_session::storage::{LoadError, SaveError, SessionKey, SessionStore, UpdateError};
use actix_web::cookie::time::Duration;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::session::{SessionState, expiry_after, generate_session_key, token};
use super::{NewSnippet, NewUser, RepositoryError, SnippetRepository, UserRepository};
use crate::domain::{Snippet, User};

#[derive(Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<i64, User>>>,
    email_index: Arc<RwLock<HashMap<String, i64>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryUserRepository {
    /// Makes every later call fail as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn remove(&self, user_id: i64) {
        if let Some(user) = self.users.write().await.remove(&user_id) {
            self.email_index.write().await.remove(&user.email);
        }
    }

    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, new_user: NewUser) -> Result<i64, RepositoryError> {
        self.check_available()?;
        let mut users = self.users.write().await;
        let mut email_index = self.email_index.write().await;
        if email_index.contains_key(&new_user.email) {
            return Err(RepositoryError::DuplicateEmail);
        }
        let id = users.keys().max().copied().unwrap_or(0) + 1;
        email_index.insert(new_user.email.clone(), id);
        users.insert(
            id,
            User {
                id,
                name: new_user.name,
                email: new_user.email,
                password_hash: new_user.password_hash,
                created_at: new_user.created_at,
            },
        );
        Ok(id)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.check_available()?;
        let email_index = self.email_index.read().await;
        let users = self.users.read().await;
        Ok(email_index.get(email).and_then(|id| users.get(id)).cloned())
    }

    async fn exists(&self, user_id: i64) -> Result<bool, RepositoryError> {
        self.check_available()?;
        Ok(self.users.read().await.contains_key(&user_id))
    }
}

#[derive(Default, Clone)]
pub struct InMemorySnippetRepository {
    snippets: Arc<RwLock<Vec<Snippet>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemorySnippetRepository {
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    /// Stores a snippet as-is, bypassing expiry computation.
    pub async fn put(&self, snippet: Snippet) {
        self.snippets.write().await.push(snippet);
    }

    pub async fn count(&self) -> usize {
        self.snippets.read().await.len()
    }
}

#[async_trait]
impl SnippetRepository for InMemorySnippetRepository {
    async fn insert(&self, new_snippet: NewSnippet) -> Result<i64, RepositoryError> {
        self.check_available()?;
        let mut snippets = self.snippets.write().await;
        let id = snippets.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        snippets.push(Snippet {
            id,
            title: new_snippet.title,
            content: new_snippet.content,
            created: new_snippet.created,
            expires: new_snippet.expires,
        });
        Ok(id)
    }

    async fn find_visible(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Snippet>, RepositoryError> {
        self.check_available()?;
        Ok(self
            .snippets
            .read()
            .await
            .iter()
            .find(|s| s.id == id && s.is_visible_at(now))
            .cloned())
    }

    async fn latest_visible(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Snippet>, RepositoryError> {
        self.check_available()?;
        let mut visible: Vec<Snippet> = self
            .snippets
            .read()
            .await
            .iter()
            .filter(|s| s.is_visible_at(now))
            .cloned()
            .collect();
        visible.sort_by(|a, b| b.created.cmp(&a.created));
        visible.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(visible)
    }
}

/// Server-side sessions kept in process memory, keyed by the cookie token.
#[derive(Default, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, (SessionState, DateTime<Utc>)>>>,
}

impl InMemorySessionStore {
    /// Number of stored sessions, live or expired.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn insert(&self, state: SessionState, ttl: &Duration) -> Result<SessionKey, anyhow::Error> {
        let expiry = expiry_after(ttl)?;
        let key = generate_session_key()?;
        self.sessions
            .write()
            .await
            .insert(token(&key).to_string(), (state, expiry));
        Ok(key)
    }
}

impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_key: &SessionKey) -> Result<Option<SessionState>, LoadError> {
        let now = Utc::now();
        Ok(self
            .sessions
            .read()
            .await
            .get(token(&session_key))
            .filter(|(_, expiry)| *expiry > now)
            .map(|(state, _)| state.clone()))
    }

    async fn save(
        &self,
        session_state: SessionState,
        ttl: &Duration,
    ) -> Result<SessionKey, SaveError> {
        self.insert(session_state, ttl).await.map_err(SaveError::Other)
    }

    async fn update(
        &self,
        session_key: SessionKey,
        session_state: SessionState,
        ttl: &Duration,
    ) -> Result<SessionKey, UpdateError> {
        let expiry = expiry_after(ttl).map_err(UpdateError::Other)?;
        let mut sessions = self.sessions.write().await;
        if let Some(entry) = sessions.get_mut(token(&session_key)) {
            *entry = (session_state, expiry);
            return Ok(session_key);
        }
        drop(sessions);
        self.insert(session_state, ttl).await.map_err(UpdateError::Other)
    }

    async fn update_ttl(&self, session_key: &SessionKey, ttl: &Duration) -> Result<(), anyhow::Error> {
        let expiry = expiry_after(ttl)?;
        if let Some(entry) = self.sessions.write().await.get_mut(token(&session_key)) {
            entry.1 = expiry;
        }
        Ok(())
    }

    async fn delete(&self, session_key: &SessionKey) -> Result<(), anyhow::Error> {
        self.sessions.write().await.remove(token(&session_key));
        Ok(())
    }
}
