use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use axum_helpers::{AppError, AuthContext, TokenVerifier};
use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{
    AUTH_TOKEN_NAME, AuthResponse, LoginRequest, RegisterRequest, TOKEN_TYPE, User, UserResponse,
};
use crate::repository::{TokenRepository, UserRepository};
use crate::tokens;

/// Registration, login and bearer-token lifecycle
pub struct AuthService<U: UserRepository, T: TokenRepository> {
    users: Arc<U>,
    tokens: Arc<T>,
}

impl<U: UserRepository, T: TokenRepository> AuthService<U, T> {
    pub fn new(users: U, tokens: T) -> Self {
        Self {
            users: Arc::new(users),
            tokens: Arc::new(tokens),
        }
    }

    /// Create an account and sign it in
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterRequest) -> UserResult<AuthResponse> {
        let email = normalize_email(&input.email);
        if self.users.email_exists(&email).await? {
            return Err(UserError::DuplicateEmail(email));
        }

        let password_hash = hash_password(&input.password)?;
        let user = User::new(input.name.trim().to_string(), email, password_hash);
        let user = self.users.create(user).await?;

        self.issue_token(user).await
    }

    /// Check credentials and issue a new token. Existing tokens stay valid.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginRequest) -> UserResult<AuthResponse> {
        let email = normalize_email(&input.email);
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(UserError::InvalidCredentials);
        }

        self.issue_token(user).await
    }

    /// Revoke the token behind `context` and nothing else
    #[instrument(skip(self, context), fields(user_id = %context.user_id, token_id = %context.token_id))]
    pub async fn logout(&self, context: &AuthContext) -> UserResult<()> {
        if !self.tokens.delete(context.token_id).await? {
            tracing::debug!("Token was already revoked");
        }
        Ok(())
    }

    pub async fn current_user(&self, id: Uuid) -> UserResult<UserResponse> {
        self.users
            .get_by_id(id)
            .await?
            .map(Into::into)
            .ok_or(UserError::NotFound(id))
    }

    /// Resolve a plaintext bearer token.
    ///
    /// Tokens carrying an id prefix are looked up by id, others by digest.
    /// `Ok(None)` covers unknown tokens, digest mismatches and tokens whose
    /// owner no longer exists.
    pub async fn verify_token(&self, plaintext: &str) -> UserResult<Option<AuthContext>> {
        let (id, secret) = tokens::parse(plaintext);

        let record = match id {
            Some(id) => self.tokens.get_by_id(id).await?,
            None => self.tokens.find_by_hash(&tokens::digest(secret)).await?,
        };
        let Some(record) = record.filter(|t| tokens::verify(secret, &t.token_hash)) else {
            return Ok(None);
        };

        let Some(user) = self.users.get_by_id(record.user_id).await? else {
            return Ok(None);
        };

        self.tokens.touch(record.id, Utc::now()).await?;

        Ok(Some(AuthContext {
            user_id: user.id,
            token_id: record.id,
            name: user.name,
            email: user.email,
        }))
    }

    async fn issue_token(&self, user: User) -> UserResult<AuthResponse> {
        let issued = tokens::issue(user.id, AUTH_TOKEN_NAME);
        self.tokens.create(issued.record).await?;

        Ok(AuthResponse {
            user: user.into(),
            token: issued.plaintext,
            token_type: TOKEN_TYPE.to_string(),
        })
    }
}

impl<U: UserRepository, T: TokenRepository> Clone for AuthService<U, T> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            tokens: Arc::clone(&self.tokens),
        }
    }
}

#[async_trait]
impl<U, T> TokenVerifier for AuthService<U, T>
where
    U: UserRepository + 'static,
    T: TokenRepository + 'static,
{
    async fn verify(&self, token: &str) -> Result<Option<AuthContext>, AppError> {
        self.verify_token(token).await.map_err(AppError::from)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> UserResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> UserResult<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
