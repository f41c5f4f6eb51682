//! Catalog API - REST server

use axum_helpers::server::{create_production_app, health_router};
use catalog_api::{api, app, config::Config, state::AppState};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::postgres::{connect_from_config_with_retry, run_migrations};
use migration::Migrator;
use tracing::info;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!("Connecting to PostgreSQL");
    let db = connect_from_config_with_retry(config.postgres.clone(), None).await?;

    if config.postgres.run_migrations {
        run_migrations::<Migrator>(&db, config.app.name).await?;
    }

    tokio::fs::create_dir_all(&config.storage.public_root).await?;
    info!(root = %config.storage.public_root.display(), "Public storage ready");

    let state = AppState {
        config: config.clone(),
        db,
    };

    let router = app(
        api::routes(&state),
        &config.cors,
        &config.storage,
        config.server.body_limit,
    )?
    .merge(health_router(config.app.clone()))
    .merge(api::health::router(state.clone()));

    info!(
        "Starting {} v{} on port {}",
        config.app.name, config.app.version, config.server.port
    );

    create_production_app(router, &config.server, async move {
        info!("Shutting down: closing PostgreSQL pool");
        if let Err(e) = state.db.close().await {
            tracing::warn!(error = %e, "Failed to close PostgreSQL pool");
        }
        info!("PostgreSQL pool closed");
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Catalog API shutdown complete");
    Ok(())
}
