use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::services::llm_service::LlmConfig;
use crate::services::news_service::NewsConfig;

/// Runtime settings read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub llm: LlmConfig,
    pub news: NewsConfig,
    pub external_api_timeout: Duration,
    pub stock_cache_ttl: Duration,
    pub news_cache_ttl: Duration,
    pub cache_max_entries: usize,
    pub rate_limit_per_minute: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["http://localhost:3000".to_string()],
            llm: LlmConfig::default(),
            news: NewsConfig::default(),
            external_api_timeout: Duration::from_secs(30),
            stock_cache_ttl: Duration::from_secs(300),
            news_cache_ttl: Duration::from_secs(900),
            cache_max_entries: 100,
            rate_limit_per_minute: 10,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or(defaults.cors_origins),
            llm: LlmConfig::from_env(),
            news: NewsConfig::from_env(),
            external_api_timeout: Duration::from_secs(env_or("EXTERNAL_API_TIMEOUT", 30)),
            stock_cache_ttl: Duration::from_secs(env_or("STOCK_DATA_CACHE_TTL", 300)),
            news_cache_ttl: Duration::from_secs(env_or("NEWS_CACHE_TTL", 900)),
            cache_max_entries: env_or("CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            rate_limit_per_minute: env_or("RATE_LIMIT_PER_MINUTE", defaults.rate_limit_per_minute),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Read `key` and parse it, falling back to `default` when unset or malformed.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring invalid value for {}: {:?}", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
