use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Token type reported alongside every issued token.
pub const TOKEN_TYPE: &str = "Bearer";

/// Name given to tokens minted by register and login.
pub const AUTH_TOKEN_NAME: &str = "auth_token";

/// User entity - matches SQL schema
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Stored lower-cased
    pub email: String,
    /// Argon2 password hash (never exposed in API responses)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name,
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

/// User as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Personal access token row. The plaintext is never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonalAccessToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    /// SHA-256 hex digest of the secret half of the plaintext token
    pub token_hash: String,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// DTO for account registration
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(
        custom(function = "required", message = "The name field is required."),
        length(max = 255, message = "The name field must not be greater than 255 characters.")
    )]
    #[schema(example = "Ada Lovelace")]
    pub name: String,

    #[serde(default)]
    #[validate(
        custom(function = "required", message = "The email field is required."),
        email(message = "The email field must be a valid email address."),
        length(max = 255, message = "The email field must not be greater than 255 characters.")
    )]
    #[schema(example = "ada@example.com")]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 8, message = "The password field must be at least 8 characters."))]
    #[schema(example = "correct-horse-battery")]
    pub password: String,
}

/// DTO for user login
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(
        custom(function = "required", message = "The email field is required."),
        email(message = "The email field must be a valid email address.")
    )]
    #[schema(example = "ada@example.com")]
    pub email: String,

    #[serde(default)]
    #[validate(custom(function = "required", message = "The password field is required."))]
    pub password: String,
}

/// Issued token with its owner
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    /// Plaintext bearer token; shown once
    #[schema(example = "0192f0c4-8a6e-7c1d-b2a3-5f7e9d0c1b2a|4f1c...")]
    pub token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
