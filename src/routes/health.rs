use axum::{routing::get, Json, Router};
use tracing::info;

use crate::models::HealthResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/", get(health))
        .route("/v1", get(health))
}

async fn health() -> Json<HealthResponse> {
    info!("GET /v1/ - Health check");
    Json(HealthResponse {
        status: "active".to_string(),
        message: "HedgeAI API is online".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
