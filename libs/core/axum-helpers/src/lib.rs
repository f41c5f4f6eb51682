//! # Axum Helpers
//!
//! Shared building blocks for the catalog HTTP services.
//!
//! - **[`auth`]**: bearer-token middleware and the `CurrentUser` extractor
//! - **[`server`]**: router assembly, health checks, graceful shutdown
//! - **[`http`]**: CORS and security headers
//! - **[`errors`]**: `AppError` and the JSON error body
//! - **[`extractors`]**: UUID path, validated JSON, query parameters
//! - **[`audit`]**: audit events on the `audit` tracing target

pub mod audit;
pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use auth::{AuthContext, CurrentUser, TokenVerifier, bearer_auth_middleware};

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    health_router, run_health_checks, shutdown_signal,
};

pub use http::{create_cors_layer, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse, FieldErrors};

pub use extractors::{QueryParams, UuidPath, ValidatedJson};

pub use audit::{AuditEvent, AuditOutcome, extract_ip_from_headers, extract_user_agent};
