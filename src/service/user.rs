use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::instrument;

use crate::domain::{HashedPassword, PasswordHashError};
use crate::repository::{NewUser, RepositoryError, UserRepository};
use crate::util::password::{
    PASSWORD_COST, PasswordError, hash_password_blocking, verify_password_blocking,
};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("email address is already in use")]
    DuplicateEmail,
    /// Unknown email and wrong password are deliberately the same error.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Repository(RepositoryError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Hash(#[from] PasswordHashError),
}

impl From<RepositoryError> for UserError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateEmail => UserError::DuplicateEmail,
            other => UserError::Repository(other),
        }
    }
}

/// Credential model: password hashing, login and the liveness check used by
/// session authentication.
#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    password_cost: u32,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self {
            repository,
            password_cost: PASSWORD_COST,
        }
    }

    /// Lower bcrypt cost for test suites; production uses [`PASSWORD_COST`].
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    #[instrument(skip(self, name, password))]
    pub async fn insert(&self, name: &str, email: &str, password: &str) -> Result<i64, UserError> {
        let hashed = hash_password_blocking(password.to_string(), self.password_cost).await?;
        let password_hash = HashedPassword::new(hashed)?;

        let id = self
            .repository
            .insert(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(user_id = id, "user signed up");
        Ok(id)
    }

    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<i64, UserError> {
        let user = self
            .repository
            .find_by_email(email)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        let password_ok =
            verify_password_blocking(password.to_string(), user.password_hash.as_str().to_string())
                .await?;
        if !password_ok {
            return Err(UserError::InvalidCredentials);
        }

        Ok(user.id)
    }

    /// Whether a user with `user_id` currently exists.
    pub async fn check(&self, user_id: i64) -> Result<bool, UserError> {
        Ok(self.repository.exists(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::InMemoryUserRepository;

    fn service(repo: InMemoryUserRepository) -> UserService {
        UserService::new(Arc::new(repo)).with_password_cost(4)
    }

    #[tokio::test]
    async fn insert_then_authenticate() {
        let service = service(InMemoryUserRepository::default());
        let id = service
            .insert("Alice", "alice@example.com", "pa55word!")
            .await
            .unwrap();

        assert_eq!(
            service.authenticate("alice@example.com", "pa55word!").await.unwrap(),
            id
        );
        assert!(service.check(id).await.unwrap());
        assert!(!service.check(id + 1).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_is_distinct_error() {
        let repo = InMemoryUserRepository::default();
        let service = service(repo.clone());
        service.insert("Alice", "alice@example.com", "pa55word!").await.unwrap();

        let err = service
            .insert("Other", "alice@example.com", "different1")
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::DuplicateEmail));
        assert_eq!(repo.count().await, 1);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let service = service(InMemoryUserRepository::default());
        service.insert("Alice", "alice@example.com", "pa55word!").await.unwrap();

        let wrong_password = service
            .authenticate("alice@example.com", "not-the-password")
            .await
            .unwrap_err();
        let unknown_email = service
            .authenticate("bob@example.com", "pa55word!")
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, UserError::InvalidCredentials));
        assert!(matches!(unknown_email, UserError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn persistence_failure_is_not_invalid_credentials() {
        let repo = InMemoryUserRepository::default();
        let service = service(repo.clone());
        repo.set_unavailable(true);

        let err = service
            .authenticate("alice@example.com", "pa55word!")
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Repository(RepositoryError::Database(_))));
        assert!(service.check(1).await.is_err());
    }
}
