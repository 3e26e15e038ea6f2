use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::models::TickerError;

/// Message returned to clients for every 500; the real cause only goes to the logs.
pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred during analysis";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Rate limit exceeded")]
    RateLimited { retry_after_secs: u64 },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "detail": msg }))).into_response()
            }
            AppError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "detail": msg }))).into_response()
            }
            AppError::RateLimited { retry_after_secs } => {
                let mut headers = HeaderMap::new();
                headers.insert("Retry-After", HeaderValue::from(retry_after_secs));
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    headers,
                    Json(json!({ "detail": "Rate limit exceeded. Please try again later." })),
                )
                    .into_response()
            }
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": INTERNAL_ERROR_MESSAGE })),
                )
                    .into_response()
            }
        }
    }
}

impl From<TickerError> for AppError {
    fn from(value: TickerError) -> Self {
        AppError::Validation(value.to_string())
    }
}

impl From<LlmError> for AppError {
    fn from(value: LlmError) -> Self {
        match value {
            LlmError::MissingApiKey => AppError::ServiceUnavailable(
                "Analysis service unavailable. Check API key configuration.".to_string(),
            ),
            other => AppError::Internal(format!("AI analysis failed: {}", other)),
        }
    }
}

/// Failures talking to the language model.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API Key: ANTHROPIC_API_KEY is not configured")]
    MissingApiKey,
    #[error("LLM request timed out")]
    Timeout,
    #[error("LLM provider rejected the credential")]
    Unauthorized,
    #[error("LLM provider rate limited the request")]
    RateLimited,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Validation("bad".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::ServiceUnavailable("down".into()).into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Internal("boom".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = AppError::RateLimited { retry_after_secs: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["Retry-After"], "42");
    }

    #[test]
    fn test_llm_errors_map_to_app_errors() {
        assert!(matches!(
            AppError::from(LlmError::MissingApiKey),
            AppError::ServiceUnavailable(_)
        ));
        assert!(matches!(
            AppError::from(LlmError::Timeout),
            AppError::Internal(_)
        ));
    }
}
