use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::config::env_or;
use crate::external::market_data_provider::ProviderError;
use crate::models::{NewsItem, TickerSymbol};

const YAHOO_SEARCH_URL: &str = "https://query1.finance.yahoo.com/v1/finance/search";
const SERPER_NEWS_URL: &str = "https://google.serper.dev/news";

/// Configuration for news service
#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub provider: String,
    pub api_key: Option<String>,
    pub max_results: usize,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            provider: "yahoo".to_string(),
            api_key: None,
            max_results: 5,
        }
    }
}

impl NewsConfig {
    pub fn from_env() -> Self {
        Self {
            provider: std::env::var("NEWS_PROVIDER").unwrap_or_else(|_| "yahoo".to_string()),
            api_key: std::env::var("NEWS_API_KEY").ok().filter(|key| !key.trim().is_empty()),
            max_results: env_or("NEWS_MAX_RESULTS", 5),
        }
    }
}

/// Trait for news providers
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Headlines for `ticker`, most relevant first.
    async fn fetch_news(&self, ticker: &str, max_results: usize) -> Result<Vec<NewsItem>, ProviderError>;
}

/// Yahoo Finance search endpoint; needs no API key.
pub struct YahooNewsProvider {
    client: Client,
}

impl YahooNewsProvider {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; HedgeAI/1.0)")
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[derive(Debug, Deserialize)]
struct YahooSearchResponse {
    #[serde(default)]
    news: Vec<YahooNewsItem>,
}

#[derive(Debug, Deserialize)]
struct YahooNewsItem {
    title: String,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    link: Option<String>,
}

#[async_trait]
impl NewsProvider for YahooNewsProvider {
    async fn fetch_news(&self, ticker: &str, max_results: usize) -> Result<Vec<NewsItem>, ProviderError> {
        info!("Fetching news from Yahoo Finance for {}", ticker);

        let count = max_results.to_string();
        let response = self
            .client
            .get(YAHOO_SEARCH_URL)
            .query(&[
                ("q", ticker),
                ("newsCount", count.as_str()),
                ("quotesCount", "0"),
            ])
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ProviderError::BadResponse(format!("Yahoo search returned {}", status)));
        }

        let body: YahooSearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(body
            .news
            .into_iter()
            .map(|item| NewsItem {
                title: item.title,
                source: item.publisher.unwrap_or_default(),
                url: item.link,
            })
            .collect())
    }
}

/// Serper API provider (uses Google's news search)
pub struct SerperProvider {
    api_key: String,
    client: Client,
}

impl SerperProvider {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(Self { api_key, client })
    }
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    news: Option<Vec<SerperNewsItem>>,
}

#[derive(Debug, Deserialize)]
struct SerperNewsItem {
    title: String,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

#[async_trait]
impl NewsProvider for SerperProvider {
    async fn fetch_news(&self, ticker: &str, max_results: usize) -> Result<Vec<NewsItem>, ProviderError> {
        let query = format!("{} stock news", ticker);
        info!("Fetching news from Serper for query: {}", query);

        let request_body = serde_json::json!({
            "q": query,
            "type": "news",
            "num": max_results.min(100), // Serper max is 100
        });

        let response = self
            .client
            .post(SERPER_NEWS_URL)
            .header("X-API-KEY", &self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!("Serper API request failed: {}", e);
                ProviderError::from_reqwest(e)
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Serper API error {}: {}", status, error_text);
            return Err(ProviderError::BadResponse(format!("HTTP {}: {}", status, error_text)));
        }

        let serper_response: SerperResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(serper_response
            .news
            .unwrap_or_default()
            .into_iter()
            .map(|item| NewsItem {
                title: item.title,
                source: item.source.unwrap_or_default(),
                url: item.link,
            })
            .collect())
    }
}

/// Pick a provider from configuration. `None` means news is switched off.
pub fn provider_from_config(
    config: &NewsConfig,
    timeout: Duration,
) -> Result<Option<Arc<dyn NewsProvider>>, ProviderError> {
    match config.provider.to_lowercase().as_str() {
        "yahoo" => {
            info!("Initializing Yahoo Finance news provider");
            Ok(Some(Arc::new(YahooNewsProvider::new(timeout)?)))
        }
        "serper" => match &config.api_key {
            Some(api_key) => {
                info!("Initializing Serper news provider");
                Ok(Some(Arc::new(SerperProvider::new(api_key.clone(), timeout)?)))
            }
            None => {
                warn!("Serper news provider selected but NEWS_API_KEY is not set; news disabled");
                Ok(None)
            }
        },
        "none" | "disabled" => {
            info!("News service disabled");
            Ok(None)
        }
        other => {
            warn!("Unknown news provider: {}. News disabled.", other);
            Ok(None)
        }
    }
}

/// Fetches headlines for a ticker. Never fails: errors yield an empty list.
#[derive(Clone)]
pub struct NewsFetcher {
    provider: Option<Arc<dyn NewsProvider>>,
    timeout: Duration,
}

impl NewsFetcher {
    pub fn new(provider: Option<Arc<dyn NewsProvider>>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn fetch(&self, ticker: &TickerSymbol, max_results: usize) -> Vec<NewsItem> {
        self.try_fetch(ticker, max_results).await.unwrap_or_default()
    }

    /// Like [`fetch`](Self::fetch), but `None` when the provider failed or
    /// timed out. A disabled provider or a zero cap is a real empty result.
    pub(crate) async fn try_fetch(&self, ticker: &TickerSymbol, max_results: usize) -> Option<Vec<NewsItem>> {
        let Some(provider) = self.provider.as_ref() else {
            return Some(Vec::new());
        };
        if max_results == 0 {
            return Some(Vec::new());
        }

        // Ask for extra so duplicates do not leave us short.
        let requested = max_results.saturating_mul(2);
        let fetched = tokio::time::timeout(self.timeout, provider.fetch_news(ticker.as_str(), requested)).await;

        match fetched {
            Ok(Ok(items)) => {
                let news = normalize_news(items, max_results);
                info!("[News] Fetched {} news items for {}", news.len(), ticker);
                Some(news)
            }
            Ok(Err(e)) => {
                warn!("[News] News fetch failed for {}: {}", ticker, e);
                None
            }
            Err(_) => {
                warn!("[News] News fetch timed out for {} after {:?}", ticker, self.timeout);
                None
            }
        }
    }
}

/// Clean up provider items: trim, drop blank titles, remove repeated
/// (title, source) pairs keeping the first, and cap the length.
pub fn normalize_news(items: Vec<NewsItem>, max_results: usize) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter_map(|item| {
            let title = item.title.trim().to_string();
            if title.is_empty() {
                return None;
            }
            let source = match item.source.trim() {
                "" => "Unknown".to_string(),
                s => s.to_string(),
            };
            let url = item
                .url
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty());
            Some(NewsItem { title, source, url })
        })
        .filter(|item| seen.insert((item.title.clone(), item.source.clone())))
        .take(max_results)
        .collect()
}
