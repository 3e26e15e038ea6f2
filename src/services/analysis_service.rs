use std::sync::Arc;

use chrono::Utc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{AnalysisResult, NewsItem, StockSnapshot, TickerSymbol};
use crate::services::cache_service::CacheLayer;
use crate::services::market_data_service::MarketDataFetcher;
use crate::services::news_service::NewsFetcher;
use crate::services::ticker_service::resolve_and_validate;
use crate::services::verdict_service::VerdictGenerator;

/// Runs one analysis: resolve, fetch (cached, metrics and news concurrently),
/// generate the verdict, assemble the response.
pub struct AnalysisService {
    market_data: MarketDataFetcher,
    news: NewsFetcher,
    verdict: VerdictGenerator,
    cache: Arc<CacheLayer>,
    news_max_results: usize,
}

impl AnalysisService {
    pub fn new(
        market_data: MarketDataFetcher,
        news: NewsFetcher,
        verdict: VerdictGenerator,
        cache: Arc<CacheLayer>,
        news_max_results: usize,
    ) -> Self {
        Self {
            market_data,
            news,
            verdict,
            cache,
            news_max_results,
        }
    }

    pub fn cache(&self) -> &Arc<CacheLayer> {
        &self.cache
    }

    /// Resolve a free-text query and analyze the resulting ticker.
    pub async fn analyze_query(&self, query: &str) -> Result<AnalysisResult, AppError> {
        let ticker = resolve_and_validate(query)?;
        info!("[Analysis] Original query: '{}', resolved ticker: '{}'", query, ticker);
        self.analyze(&ticker).await
    }

    pub async fn analyze(&self, ticker: &TickerSymbol) -> Result<AnalysisResult, AppError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("analysis", %request_id, ticker = %ticker);

        async move {
            info!("[Analysis] Starting analysis");

            let (snapshot, news) = tokio::join!(self.snapshot_for(ticker), self.news_for(ticker));

            let verdict = self
                .verdict
                .generate(ticker, &snapshot.company_name, &snapshot.metrics, &news)
                .await?;

            info!("[Analysis] Completed with rating {}", verdict.rating);

            Ok(AnalysisResult {
                ticker: ticker.clone(),
                company_name: snapshot.company_name,
                rating: verdict.rating,
                metrics: snapshot.metrics,
                news,
                analysis: verdict.analysis,
                generated_at: Utc::now(),
            })
        }
        .instrument(span)
        .await
    }

    async fn snapshot_for(&self, ticker: &TickerSymbol) -> StockSnapshot {
        if let Some(cached) = self.cache.metrics.get(ticker) {
            return cached;
        }
        match self.market_data.try_fetch(ticker).await {
            Some(snapshot) => {
                self.cache.metrics.set(ticker.clone(), snapshot.clone());
                snapshot
            }
            // Fallbacks are not cached; the next request retries the provider.
            None => StockSnapshot::unavailable(ticker.as_str()),
        }
    }

    async fn news_for(&self, ticker: &TickerSymbol) -> Vec<NewsItem> {
        if let Some(cached) = self.cache.news.get(ticker) {
            return cached;
        }
        match self.news.try_fetch(ticker, self.news_max_results).await {
            Some(news) => {
                self.cache.news.set(ticker.clone(), news.clone());
                news
            }
            None => Vec::new(),
        }
    }
}
