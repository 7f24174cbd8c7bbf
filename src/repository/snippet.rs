use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use super::RepositoryError;
use crate::domain::Snippet;

#[async_trait]
pub trait SnippetRepository: Send + Sync {
    async fn insert(&self, new_snippet: NewSnippet) -> Result<i64, RepositoryError>;
    /// The snippet with `id` if it is still visible at `now`.
    async fn find_visible(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Snippet>, RepositoryError>;
    /// Up to `limit` snippets visible at `now`, newest first.
    async fn latest_visible(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Snippet>, RepositoryError>;
}

#[derive(Debug, Clone)]
pub struct NewSnippet {
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

pub struct PgSnippetRepository {
    pool: PgPool,
}

impl PgSnippetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnippetRepository for PgSnippetRepository {
    async fn insert(&self, new_snippet: NewSnippet) -> Result<i64, RepositoryError> {
        let row = sqlx::query(
            r#"
            INSERT INTO snippets (title, content, created, expires)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(new_snippet.title)
        .bind(new_snippet.content)
        .bind(new_snippet.created)
        .bind(new_snippet.expires)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("id")?)
    }

    async fn find_visible(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Snippet>, RepositoryError> {
        let maybe_row = sqlx::query(
            r#"
            SELECT id, title, content, created, expires
            FROM snippets
            WHERE expires > $2 AND id = $1
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(maybe_row.map(map_row_to_snippet).transpose()?)
    }

    async fn latest_visible(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Snippet>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, content, created, expires
            FROM snippets
            WHERE expires > $1
            ORDER BY created DESC
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(map_row_to_snippet)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

fn map_row_to_snippet(row: PgRow) -> Result<Snippet, sqlx::Error> {
    Ok(Snippet {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        created: row.try_get("created")?,
        expires: row.try_get("expires")?,
    })
}
