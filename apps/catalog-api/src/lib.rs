//! Catalog API - product catalog REST server
//!
//! Wires the users and products domains onto PostgreSQL and the local
//! public storage area. The binary in `main.rs` only reads configuration
//! and runs [`app`] under the production server.

pub mod api;
pub mod config;
pub mod openapi;
pub mod state;

use axum::Router;
use core_config::{cors::CorsConfig, storage::StorageConfig};
use std::io;
use tower_http::services::ServeDir;

/// Documented API under `/api`, plus the public storage area when it is
/// served by this process.
pub fn app(
    routes: Router,
    cors: &CorsConfig,
    storage: &StorageConfig,
    body_limit: usize,
) -> io::Result<Router> {
    let router = axum_helpers::create_router::<openapi::ApiDoc>(routes, cors, body_limit)?;

    // An absolute STORAGE_PUBLIC_URL points at some other host
    if storage.public_url.starts_with('/') {
        return Ok(router.nest_service(&storage.public_url, ServeDir::new(&storage.public_root)));
    }
    Ok(router)
}
