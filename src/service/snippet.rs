use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::instrument;

use crate::domain::{LATEST_LIMIT, Snippet, expiry_from};
use crate::repository::{NewSnippet, RepositoryError, SnippetRepository};

#[derive(Debug, Error)]
pub enum SnippetError {
    /// Missing and expired snippets are indistinguishable.
    #[error("no matching snippet found")]
    NoRecord,
    #[error("expiry of {0} days is out of range")]
    InvalidExpiry(i64),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Clone)]
pub struct SnippetService {
    repository: Arc<dyn SnippetRepository>,
}

impl SnippetService {
    pub fn new(repository: Arc<dyn SnippetRepository>) -> Self {
        Self { repository }
    }

    /// Stores a snippet expiring `expires_days` after now. Callers validate
    /// the day count against the permitted set beforehand.
    #[instrument(skip(self, title, content))]
    pub async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_days: i64,
    ) -> Result<i64, SnippetError> {
        let created = Utc::now();
        let expires = expiry_from(created, expires_days)
            .ok_or(SnippetError::InvalidExpiry(expires_days))?;

        let id = self
            .repository
            .insert(NewSnippet {
                title: title.to_string(),
                content: content.to_string(),
                created,
                expires,
            })
            .await?;
        Ok(id)
    }

    pub async fn get(&self, id: i64) -> Result<Snippet, SnippetError> {
        self.repository
            .find_visible(id, Utc::now())
            .await?
            .ok_or(SnippetError::NoRecord)
    }

    /// The most recently created snippets that have not expired.
    pub async fn latest(&self) -> Result<Vec<Snippet>, SnippetError> {
        Ok(self
            .repository
            .latest_visible(Utc::now(), LATEST_LIMIT)
            .await?)
    }
}
