use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use hedgeai_backend::app;
use hedgeai_backend::config::AppConfig;
use hedgeai_backend::external::yahoo::YahooProvider;
use hedgeai_backend::logging::{init_logging, LoggingConfig};
use hedgeai_backend::services::analysis_service::AnalysisService;
use hedgeai_backend::services::cache_service::CacheLayer;
use hedgeai_backend::services::market_data_service::MarketDataFetcher;
use hedgeai_backend::services::news_service::{provider_from_config, NewsFetcher};
use hedgeai_backend::services::rate_limiter::ClientRateLimiter;
use hedgeai_backend::services::verdict_service::VerdictGenerator;
use hedgeai_backend::state::AppState;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())?;

    let config = AppConfig::from_env();
    let timeout = config.external_api_timeout;

    let cache = Arc::new(CacheLayer::new(
        config.stock_cache_ttl,
        config.news_cache_ttl,
        config.cache_max_entries,
    ));
    let rate_limiter = Arc::new(ClientRateLimiter::per_minute(config.rate_limit_per_minute));

    let analysis = match VerdictGenerator::from_config(&config.llm) {
        Ok(verdict) => {
            let market_data = MarketDataFetcher::new(Arc::new(YahooProvider::new(timeout)?), timeout);
            let news = NewsFetcher::new(provider_from_config(&config.news, timeout)?, timeout);
            if !news.is_enabled() {
                warn!("News provider not configured; analyses will run without headlines");
            }
            info!("📊 Analysis service loaded successfully");
            Some(Arc::new(AnalysisService::new(
                market_data,
                news,
                verdict,
                cache.clone(),
                config.news.max_results,
            )))
        }
        Err(e) => {
            error!("Failed to initialize analysis service: {}", e);
            None
        }
    };

    spawn_sweeper(cache, rate_limiter.clone());

    let state = AppState {
        analysis,
        rate_limiter,
    };
    let app = app::create_app(state, &config.cors_origins);

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("🚀 HedgeAI backend running at http://{}/", listener.local_addr()?);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

/// Periodically evicts expired cache entries and idle rate-limit buckets.
fn spawn_sweeper(cache: Arc<CacheLayer>, rate_limiter: Arc<ClientRateLimiter>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = cache.purge_expired();
            let idle = rate_limiter.cleanup_expired();
            if purged > 0 || idle > 0 {
                info!("Sweep removed {} cache entries and {} idle clients", purged, idle);
            }
        }
    });
}
