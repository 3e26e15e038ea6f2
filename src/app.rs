use std::any::Any;

use axum::http::{HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any as AnyHeader, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::errors::AppError;
use crate::routes::{analyze, health};
use crate::state::AppState;

pub fn create_app(state: AppState, cors_origins: &[String]) -> Router {
    Router::<AppState>::new()
        .merge(health::router())
        .nest("/v1/api/analyze", analyze::router(&state))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Skipping invalid CORS origin: {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET])
        .allow_headers(AnyHeader)
}

fn handle_panic(_err: Box<dyn Any + Send + 'static>) -> Response {
    AppError::Internal("request handler panicked".to_string()).into_response()
}
