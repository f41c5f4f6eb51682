//! Readiness endpoint
//!
//! Liveness lives in `axum_helpers::health_router`; `/ready` additionally
//! probes the database and the image storage.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use axum_helpers::{HealthCheckFuture, run_health_checks};
use domain_products::{ImageStorage, LocalImageStorage};
use serde_json::Value;

use crate::state::AppState;

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let storage = LocalImageStorage::new(&state.config.storage);

    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![
        (
            "database",
            Box::pin(async {
                database::postgres::check_health(&state.db)
                    .await
                    .map_err(|e| e.to_string())
            }),
        ),
        (
            "storage",
            Box::pin(async { storage.health_check().await.map_err(|e| e.to_string()) }),
        ),
    ];

    run_health_checks(checks).await
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/ready", get(ready)).with_state(state)
}
