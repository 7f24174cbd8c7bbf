//! Per-request authentication state.
//!
//! A request starts out [`AuthState::Anonymous`] and only becomes
//! [`AuthState::Authenticated`] when the session carries a non-zero user id
//! *and* that user still exists. A stale id leaves the request anonymous
//! without touching the session; a failing liveness check is an error.

use super::user::{UserError, UserService};

/// Session key holding the id of the logged-in user.
pub const SESSION_KEY_AUTH: &str = "authenticatedUserID";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticated(i64),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            AuthState::Authenticated(id) => Some(*id),
            AuthState::Anonymous => None,
        }
    }
}

pub async fn derive_auth_state(
    stored_user_id: Option<i64>,
    users: &UserService,
) -> Result<AuthState, UserError> {
    let user_id = match stored_user_id {
        Some(id) if id != 0 => id,
        _ => return Ok(AuthState::Anonymous),
    };

    if users.check(user_id).await? {
        Ok(AuthState::Authenticated(user_id))
    } else {
        tracing::debug!(user_id, "session refers to a user that no longer exists");
        Ok(AuthState::Anonymous)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::repository::memory::InMemoryUserRepository;

    async fn service_with_user() -> (InMemoryUserRepository, UserService, i64) {
        let repo = InMemoryUserRepository::default();
        let service = UserService::new(Arc::new(repo.clone())).with_password_cost(4);
        let id = service
            .insert("Alice", "alice@example.com", "pa55word!")
            .await
            .unwrap();
        (repo, service, id)
    }

    #[tokio::test]
    async fn missing_or_zero_id_is_anonymous() {
        let (repo, service, _) = service_with_user().await;
        // No lookup happens, so even an unreachable store is fine.
        repo.set_unavailable(true);
        assert_eq!(derive_auth_state(None, &service).await.unwrap(), AuthState::Anonymous);
        assert_eq!(derive_auth_state(Some(0), &service).await.unwrap(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn live_user_is_authenticated() {
        let (_, service, id) = service_with_user().await;
        let state = derive_auth_state(Some(id), &service).await.unwrap();
        assert_eq!(state, AuthState::Authenticated(id));
        assert!(state.is_authenticated());
        assert_eq!(state.user_id(), Some(id));
    }

    #[tokio::test]
    async fn deleted_user_falls_back_to_anonymous() {
        let (repo, service, id) = service_with_user().await;
        repo.remove(id).await;
        let state = derive_auth_state(Some(id), &service).await.unwrap();
        assert_eq!(state, AuthState::Anonymous);
        assert!(!state.is_authenticated());
    }

    #[tokio::test]
    async fn liveness_failure_is_an_error() {
        let (repo, service, id) = service_with_user().await;
        repo.set_unavailable(true);
        assert!(derive_auth_state(Some(id), &service).await.is_err());
    }
}
