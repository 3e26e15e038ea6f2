use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("symbol not found: {0}")]
    NotFound(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,
}

impl ProviderError {
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

/// Quote and fundamentals as reported by a market data provider.
///
/// Field names follow the provider's camelCase keys. Placeholders such as
/// `"N/A"`, empty strings, `{}` or non-finite numbers become `None`; anything
/// not listed here lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderQuote {
    #[serde(default, deserialize_with = "lenient_string")]
    pub short_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub long_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub current_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub regular_market_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub previous_close: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub regular_market_previous_close: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fifty_two_week_high: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fifty_two_week_low: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub market_cap: Option<f64>,
    #[serde(default, rename = "trailingPE", deserialize_with = "lenient_f64")]
    pub trailing_pe: Option<f64>,
    #[serde(default, rename = "forwardPE", deserialize_with = "lenient_f64")]
    pub forward_pe: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub regular_market_volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub average_volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub beta: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub short_percent_of_float: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub debt_to_equity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub current_ratio: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub profit_margins: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub revenue_growth: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub earnings_growth: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub target_mean_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub target_median_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub target_high_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub target_low_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub number_of_analyst_opinions: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub recommendation_key: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ProviderQuote {
    pub fn price(&self) -> Option<f64> {
        self.current_price.or(self.regular_market_price)
    }

    pub fn prev_close(&self) -> Option<f64> {
        self.previous_close.or(self.regular_market_previous_close)
    }

    pub fn last_volume(&self) -> Option<f64> {
        self.regular_market_volume.or(self.volume)
    }

    pub fn company_name(&self) -> Option<&str> {
        self.short_name.as_deref().or(self.long_name.as_deref())
    }
}

/// Numeric view of a provider value; `{"raw": x, "fmt": ".."}` wrappers are unwrapped.
pub(crate) fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let trimmed = s.trim();
            if is_placeholder(trimmed) {
                None
            } else {
                trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
            }
        }
        Value::Object(map) => map.get("raw").and_then(value_as_f64),
        _ => None,
    }
}

pub(crate) fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !is_placeholder(s.trim()) => Some(s.trim().to_string()),
        Value::Object(map) => map.get("fmt").and_then(value_as_string),
        _ => None,
    }
}

fn is_placeholder(s: &str) -> bool {
    s.is_empty() || s.eq_ignore_ascii_case("n/a") || s.eq_ignore_ascii_case("none")
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_f64))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_string))
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_quote(&self, ticker: &str) -> Result<ProviderQuote, ProviderError>;
}
