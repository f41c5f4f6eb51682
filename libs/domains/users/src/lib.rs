//! Users Domain
//!
//! Accounts and personal access tokens for the catalog API.
//!
//! # Features
//!
//! - Registration and login with Argon2 password hashing
//! - Opaque bearer tokens, stored only as SHA-256 digests
//! - Logout that revokes exactly the token used for the request
//! - [`TokenVerifier`](axum_helpers::TokenVerifier) implementation for the
//!   bearer middleware guarding other domains
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← /auth endpoints, audit events
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ AuthService │  ← Hashing, token issue/verify/revoke
//! └──────┬──────┘
//!        │
//! ┌──────▼──────────────────────────┐
//! │ UserRepository / TokenRepository│  ← In-memory or PostgreSQL
//! └──────┬──────────────────────────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_users::{
//!     handlers,
//!     repository::{InMemoryTokenRepository, InMemoryUserRepository},
//!     service::AuthService,
//! };
//!
//! let service = AuthService::new(InMemoryUserRepository::new(), InMemoryTokenRepository::new());
//! let router = handlers::router(service);
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;
pub mod tokens;

pub use error::{UserError, UserResult};
pub use handlers::ApiDoc;
pub use models::{
    AuthResponse, LoginRequest, MessageResponse, PersonalAccessToken, RegisterRequest, User,
    UserResponse,
};
pub use postgres::{PgTokenRepository, PgUserRepository};
pub use repository::{InMemoryTokenRepository, InMemoryUserRepository, TokenRepository, UserRepository};
pub use service::AuthService;
