/// API Integration Tests
///
/// Drives the full router (rate limiting, ticker resolution, caching, verdict)
/// with in-process mock providers:
/// - Health (GET /v1/)
/// - Analysis (GET /v1/api/analyze/{query})
/// - Error mapping (400 / 429 / 500 / 503)

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use hedgeai_backend::app::create_app;
use hedgeai_backend::errors::LlmError;
use hedgeai_backend::external::market_data_provider::{MarketDataProvider, ProviderError, ProviderQuote};
use hedgeai_backend::models::NewsItem;
use hedgeai_backend::services::analysis_service::AnalysisService;
use hedgeai_backend::services::cache_service::CacheLayer;
use hedgeai_backend::services::llm_service::LlmProvider;
use hedgeai_backend::services::market_data_service::MarketDataFetcher;
use hedgeai_backend::services::news_service::{NewsFetcher, NewsProvider};
use hedgeai_backend::services::rate_limiter::ClientRateLimiter;
use hedgeai_backend::services::verdict_service::VerdictGenerator;
use hedgeai_backend::state::AppState;

// ---------------------------------------------------------------------------
// Mock providers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MockQuotes {
    calls: AtomicUsize,
}

#[async_trait]
impl MarketDataProvider for MockQuotes {
    async fn fetch_quote(&self, _ticker: &str) -> Result<ProviderQuote, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProviderQuote {
            short_name: Some("Apple Inc.".into()),
            current_price: Some(151.5),
            previous_close: Some(150.0),
            fifty_two_week_high: Some(200.0),
            ..Default::default()
        })
    }
}

#[derive(Default)]
struct MockNews {
    calls: AtomicUsize,
}

#[async_trait]
impl NewsProvider for MockNews {
    async fn fetch_news(&self, _ticker: &str, _max: usize) -> Result<Vec<NewsItem>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let item = |title: &str, source: &str| NewsItem {
            title: title.into(),
            source: source.into(),
            url: Some("https://news.test/a".into()),
        };
        Ok(vec![
            item("Apple faces EU fine", "Reuters"),
            item("Apple faces EU fine", "Reuters"),
            item("   ", "Bloomberg"),
            item("iPhone sales slow", ""),
        ])
    }
}

struct MockLlm {
    reply: Result<&'static str, ()>,
}

#[async_trait]
impl LlmProvider for MockLlm {
    async fn generate_completion(&self, _system: &str, _prompt: String) -> Result<String, LlmError> {
        self.reply
            .map(str::to_string)
            .map_err(|_| LlmError::ApiError("HTTP 500: upstream exploded at /internal/path".into()))
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct TestApp {
    router: Router,
    quotes: Arc<MockQuotes>,
    news: Arc<MockNews>,
}

fn test_app(llm_reply: Option<Result<&'static str, ()>>, rate_limit: usize) -> TestApp {
    let quotes = Arc::new(MockQuotes::default());
    let news = Arc::new(MockNews::default());
    let timeout = Duration::from_secs(5);

    let analysis = llm_reply.map(|reply| {
        Arc::new(AnalysisService::new(
            MarketDataFetcher::new(quotes.clone(), timeout),
            NewsFetcher::new(Some(news.clone()), timeout),
            VerdictGenerator::new(Arc::new(MockLlm { reply }), timeout),
            Arc::new(CacheLayer::new(Duration::from_secs(300), Duration::from_secs(900), 100)),
            5,
        ))
    });

    let state = AppState {
        analysis,
        rate_limiter: Arc::new(ClientRateLimiter::per_minute(rate_limit)),
    };

    TestApp {
        router: create_app(state, &["http://localhost:3000".to_string()]),
        quotes,
        news,
    }
}

fn get(uri: &str, client: [u8; 4]) -> Request<Body> {
    let mut request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((client, 40000))));
    request
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

const CLIENT: [u8; 4] = [192, 168, 1, 10];

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health_check() {
    let app = test_app(None, 10);

    let response = app.router.oneshot(get("/v1/", CLIENT)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "active");
    assert_eq!(body["message"], "HedgeAI API is online");
    assert_eq!(body["version"], "1.0.0");
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_analyze_company_name() {
    let app = test_app(Some(Ok("Momentum is fading.\n**VERDICT: BEARISH**")), 10);

    let response = app
        .router
        .oneshot(get("/v1/api/analyze/apple", CLIENT))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ticker"], "AAPL");
    assert_eq!(body["company_name"], "Apple Inc.");
    assert_eq!(body["rating"], "BEARISH");
    assert_eq!(body["metrics"]["price"], 151.5);
    assert_eq!(body["metrics"]["price_change"], 1.5);
    assert_eq!(body["metrics"]["price_change_pct"], 1.0);
    assert_eq!(body["metrics"]["pct_from_high"], -24.25);
    assert!(body["metrics"]["pe_ratio"].is_null());
    assert!(body["analysis"].as_str().unwrap().contains("Momentum is fading."));
    assert!(body["generated_at"].is_string());
}

#[tokio::test]
async fn test_analyze_dedupes_and_cleans_news() {
    let app = test_app(Some(Ok("**VERDICT: NEUTRAL**")), 10);

    let response = app
        .router
        .oneshot(get("/v1/api/analyze/AAPL", CLIENT))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let news = body["news"].as_array().unwrap();
    assert_eq!(news.len(), 2);
    assert_eq!(news[0]["title"], "Apple faces EU fine");
    assert_eq!(news[1]["source"], "Unknown");
    assert_eq!(body["rating"], "NEUTRAL");
}

#[tokio::test]
async fn test_repeat_analysis_hits_cache() {
    let app = test_app(Some(Ok("**VERDICT: NEUTRAL**")), 10);

    for _ in 0..2 {
        let response = app
            .router
            .clone()
            .oneshot(get("/v1/api/analyze/msft", CLIENT))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(app.quotes.calls.load(Ordering::SeqCst), 1);
    assert_eq!(app.news.calls.load(Ordering::SeqCst), 1);
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_invalid_queries_are_rejected_without_upstream_calls() {
    let app = test_app(Some(Ok("**VERDICT: NEUTRAL**")), 10);

    for uri in [
        "/v1/api/analyze/INVALID@TICKER",
        "/v1/api/analyze/TEST%3Cscript%3E",
        "/v1/api/analyze/VERYLONGTICKERNAME123",
    ] {
        let response = app.router.clone().oneshot(get(uri, CLIENT)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let body = body_json(response).await;
        assert_eq!(body["detail"], "Invalid ticker symbol or company name");
    }

    assert_eq!(app.quotes.calls.load(Ordering::SeqCst), 0);
    assert_eq!(app.news.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_generator_returns_503() {
    let app = test_app(None, 10);

    let response = app
        .router
        .oneshot(get("/v1/api/analyze/AAPL", CLIENT))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(
        body["detail"],
        "Analysis service unavailable. Check API key configuration."
    );
}

#[tokio::test]
async fn test_llm_failure_is_sanitized() {
    let app = test_app(Some(Err(())), 10);

    let response = app
        .router
        .oneshot(get("/v1/api/analyze/AAPL", CLIENT))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "An unexpected error occurred during analysis");
    assert!(!body.to_string().contains("/internal/path"));
}

#[tokio::test]
async fn test_rate_limit_per_client() {
    let app = test_app(None, 10);

    let mut statuses = Vec::new();
    for _ in 0..12 {
        let response = app
            .router
            .clone()
            .oneshot(get("/v1/api/analyze/AAPL", CLIENT))
            .await
            .unwrap();
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            assert!(response.headers().contains_key("retry-after"));
        }
        statuses.push(response.status());
    }

    assert!(statuses[..10].iter().all(|s| *s == StatusCode::SERVICE_UNAVAILABLE));
    assert!(statuses[10..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));

    let other_client = app
        .router
        .clone()
        .oneshot(get("/v1/api/analyze/AAPL", [192, 168, 1, 11]))
        .await
        .unwrap();
    assert_eq!(other_client.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_health_is_not_rate_limited() {
    let app = test_app(None, 1);

    for _ in 0..3 {
        let response = app.router.clone().oneshot(get("/v1/", CLIENT)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
