use axum::{
    extract::{Path, State},
    middleware,
    routing::get,
    Json, Router,
};
use tracing::info;

use crate::errors::AppError;
use crate::models::AnalysisResult;
use crate::services::rate_limiter::enforce_rate_limit;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/:query", get(analyze_stock))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            enforce_rate_limit,
        ))
}

async fn analyze_stock(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Result<Json<AnalysisResult>, AppError> {
    info!("GET /v1/api/analyze/{} - Analyzing stock", query);

    let analysis = state.analysis.as_ref().ok_or_else(|| {
        AppError::ServiceUnavailable(
            "Analysis service unavailable. Check API key configuration.".to_string(),
        )
    })?;

    let result = analysis.analyze_query(&query).await?;
    Ok(Json(result))
}
