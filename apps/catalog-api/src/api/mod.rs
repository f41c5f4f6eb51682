//! API routes module

pub mod auth;
pub mod health;
pub mod products;

use axum::Router;
use axum_helpers::TokenVerifier;
use domain_products::{ImageStorage, ProductRepository, ProductService};
use domain_users::{AuthService, TokenRepository, UserRepository};
use std::sync::Arc;

use crate::state::AppState;

/// Create all API routes on the PostgreSQL and local filesystem backends
pub fn routes(state: &AppState) -> Router {
    routes_with(auth::service(state), products::service(state))
}

/// Mount the auth and products routers on any backends.
///
/// The products guard checks tokens against the same service that issues
/// them.
pub fn routes_with<U, T, R, S>(auth: AuthService<U, T>, products: ProductService<R, S>) -> Router
where
    U: UserRepository + 'static,
    T: TokenRepository + 'static,
    R: ProductRepository + 'static,
    S: ImageStorage + 'static,
{
    let verifier: Arc<dyn TokenVerifier> = Arc::new(auth.clone());

    Router::new()
        .nest("/auth", domain_users::handlers::router(auth))
        .nest("/products", domain_products::handlers::router(products, verifier))
}
