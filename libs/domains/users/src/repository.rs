use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{PersonalAccessToken, User};

/// Repository trait for User persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; fails with `DuplicateEmail` if the email is taken
    async fn create(&self, user: User) -> UserResult<User>;

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>>;

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>>;

    async fn email_exists(&self, email: &str) -> UserResult<bool>;
}

/// Repository trait for personal access tokens
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn create(&self, token: PersonalAccessToken) -> UserResult<PersonalAccessToken>;

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<PersonalAccessToken>>;

    async fn find_by_hash(&self, token_hash: &str) -> UserResult<Option<PersonalAccessToken>>;

    /// Record that the token was just used
    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> UserResult<()>;

    /// Returns `false` if no such token existed
    async fn delete(&self, id: Uuid) -> UserResult<bool>;
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(UserError::DuplicateEmail(user.email));
        }

        users.insert(user.id, user.clone());

        tracing::info!(user_id = %user.id, "Created user");
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn email_exists(&self, email: &str) -> UserResult<bool> {
        Ok(self.get_by_email(email).await?.is_some())
    }
}

/// In-memory implementation of TokenRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryTokenRepository {
    tokens: Arc<RwLock<HashMap<Uuid, PersonalAccessToken>>>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live tokens for `user_id`
    pub async fn count_for_user(&self, user_id: Uuid) -> usize {
        let tokens = self.tokens.read().await;
        tokens.values().filter(|t| t.user_id == user_id).count()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn create(&self, token: PersonalAccessToken) -> UserResult<PersonalAccessToken> {
        let mut tokens = self.tokens.write().await;
        tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<PersonalAccessToken>> {
        let tokens = self.tokens.read().await;
        Ok(tokens.get(&id).cloned())
    }

    async fn find_by_hash(&self, token_hash: &str) -> UserResult<Option<PersonalAccessToken>> {
        let tokens = self.tokens.read().await;
        Ok(tokens.values().find(|t| t.token_hash == token_hash).cloned())
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> UserResult<()> {
        let mut tokens = self.tokens.write().await;
        if let Some(token) = tokens.get_mut(&id) {
            token.last_used_at = Some(at);
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let mut tokens = self.tokens.write().await;
        let removed = tokens.remove(&id).is_some();
        if removed {
            tracing::info!(token_id = %id, "Revoked token");
        }
        Ok(removed)
    }
}
