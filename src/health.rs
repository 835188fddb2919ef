use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tracing::{error, info};

use crate::app_state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    asset_entries: usize,
    package_entries: usize,
}

/// Reports how many entries each cache holds. Fails when a cache directory
/// cannot be listed, since every `/p/` and `/g/` request would fail too.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let assets = state.assets.store().keys().await;
    let packages = state.packages.store().keys().await;
    match (assets, packages) {
        (Ok(assets), Ok(packages)) => {
            info!("Health check passed");
            Ok(Json(HealthResponse {
                status: "OK".to_string(),
                asset_entries: assets.len(),
                package_entries: packages.len(),
            }))
        }
        (Err(e), _) | (_, Err(e)) => {
            error!(error = %e, "cache health check failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
