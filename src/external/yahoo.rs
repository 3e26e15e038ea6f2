use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::external::market_data_provider::{MarketDataProvider, ProviderError, ProviderQuote};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Modules requested from quoteSummary; earlier modules win on duplicate keys.
const QUOTE_SUMMARY_MODULES: [&str; 4] = [
    "financialData",
    "summaryDetail",
    "defaultKeyStatistics",
    "price",
];

// Yahoo rejects requests without a browser-like user agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch_quote(&self, ticker: &str) -> Result<ProviderQuote, ProviderError> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, ticker);
        debug!("Requesting Yahoo quoteSummary for {}", ticker);

        let resp = self
            .client
            .get(url)
            .query(&[("modules", QUOTE_SUMMARY_MODULES.join(","))])
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(ticker.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("Yahoo quoteSummary returned {} for {}", status, ticker);
            return Err(ProviderError::BadResponse(format!("HTTP {}: {}", status, body)));
        }

        let body = resp
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        parse_quote_summary(ticker, &body)
    }
}

/// Merge the quoteSummary modules into one flat object and read it as a quote.
pub(crate) fn parse_quote_summary(ticker: &str, body: &Value) -> Result<ProviderQuote, ProviderError> {
    let summary = body
        .get("quoteSummary")
        .ok_or_else(|| ProviderError::BadResponse("missing quoteSummary".into()))?;

    if let Some(error) = summary.get("error").filter(|e| !e.is_null()) {
        let description = error
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(ProviderError::NotFound(format!("{}: {}", ticker, description)));
    }

    let result = summary
        .get("result")
        .and_then(Value::as_array)
        .and_then(|results| results.first())
        .ok_or_else(|| ProviderError::NotFound(ticker.to_string()))?;

    let mut merged = Map::new();
    for module in QUOTE_SUMMARY_MODULES {
        let Some(fields) = result.get(module).and_then(Value::as_object) else {
            continue;
        };
        for (key, value) in fields {
            if is_empty_value(value) {
                continue;
            }
            merged.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    serde_json::from_value(Value::Object(merged)).map_err(|e| ProviderError::Parse(e.to_string()))
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_quote_summary_merges_modules() {
        let body = json!({
            "quoteSummary": {
                "result": [{
                    "price": {
                        "shortName": "Apple Inc.",
                        "regularMarketPrice": {"raw": 150.9, "fmt": "150.90"},
                        "marketCap": {"raw": 2500000000000u64, "fmt": "2.5T"}
                    },
                    "financialData": {
                        "currentPrice": {"raw": 151.5, "fmt": "151.50"},
                        "targetMeanPrice": {"raw": 180.0, "fmt": "180.00"},
                        "recommendationKey": "buy",
                        "debtToEquity": {}
                    },
                    "summaryDetail": {
                        "previousClose": {"raw": 150.0, "fmt": "150.00"},
                        "trailingPE": {"raw": 25.5, "fmt": "25.50"},
                        "fiftyTwoWeekHigh": {"raw": 199.6, "fmt": "199.60"}
                    },
                    "defaultKeyStatistics": {
                        "beta": {"raw": 1.2, "fmt": "1.20"}
                    }
                }],
                "error": null
            }
        });

        let quote = parse_quote_summary("AAPL", &body).unwrap();
        assert_eq!(quote.short_name.as_deref(), Some("Apple Inc."));
        assert_eq!(quote.price(), Some(151.5));
        assert_eq!(quote.prev_close(), Some(150.0));
        assert_eq!(quote.trailing_pe, Some(25.5));
        assert_eq!(quote.market_cap, Some(2.5e12));
        assert_eq!(quote.target_mean_price, Some(180.0));
        assert_eq!(quote.beta, Some(1.2));
        assert_eq!(quote.debt_to_equity, None);
        assert_eq!(quote.recommendation_key.as_deref(), Some("buy"));
    }

    #[test]
    fn test_parse_quote_summary_reports_not_found() {
        let body = json!({
            "quoteSummary": {
                "result": null,
                "error": {"code": "Not Found", "description": "Quote not found for ticker symbol: ZZZZ"}
            }
        });
        assert!(matches!(
            parse_quote_summary("ZZZZ", &body),
            Err(ProviderError::NotFound(_))
        ));
    }

    #[test]
    fn test_parse_quote_summary_rejects_garbage() {
        assert!(matches!(
            parse_quote_summary("AAPL", &json!({"unexpected": true})),
            Err(ProviderError::BadResponse(_))
        ));
        assert!(matches!(
            parse_quote_summary("AAPL", &json!({"quoteSummary": {"result": []}})),
            Err(ProviderError::NotFound(_))
        ));
    }
}
