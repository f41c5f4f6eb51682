//! Bearer-token authentication.
//!
//! The middleware only knows how to pull a token out of the request; a
//! [`TokenVerifier`] supplied by the users domain decides whether it is valid.
//!
//! ```ignore
//! use axum_helpers::auth::{bearer_auth_middleware, CurrentUser, TokenVerifier};
//!
//! let verifier: Arc<dyn TokenVerifier> = Arc::new(auth_service);
//!
//! let protected = Router::new()
//!     .route("/me", get(|CurrentUser(user): CurrentUser| async move { user.email }))
//!     .route_layer(axum::middleware::from_fn_with_state(verifier, bearer_auth_middleware));
//! ```

pub mod middleware;

pub use middleware::{AuthContext, CurrentUser, TokenVerifier, bearer_auth_middleware};
