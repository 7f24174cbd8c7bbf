use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use super::RepositoryError;
use crate::domain::{HashedPassword, User};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with [`RepositoryError::DuplicateEmail`] when the email is taken.
    async fn insert(&self, new_user: NewUser) -> Result<i64, RepositoryError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    async fn exists(&self, user_id: i64) -> Result<bool, RepositoryError>;
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: HashedPassword,
    pub created_at: DateTime<Utc>,
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, new_user: NewUser) -> Result<i64, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, hashed_password, created)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(new_user.name)
        .bind(new_user.email)
        .bind(new_user.password_hash.as_str())
        .bind(new_user.created_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row.try_get("id")?),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(RepositoryError::DuplicateEmail)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let maybe_row = sqlx::query(
            r#"
            SELECT id, name, email, hashed_password, created
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        maybe_row.map(map_row_to_user).transpose()
    }

    async fn exists(&self, user_id: i64) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get(0)?)
    }
}

fn map_row_to_user(row: PgRow) -> Result<User, RepositoryError> {
    let password: String = row.try_get("hashed_password")?;
    let password_hash = HashedPassword::new(password)
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash,
        created_at: row.try_get("created")?,
    })
}
