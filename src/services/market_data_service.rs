use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::external::market_data_provider::{MarketDataProvider, ProviderError, ProviderQuote};
use crate::models::{StockMetrics, StockSnapshot, TickerSymbol};

/// Fetches quotes and turns them into [`StockSnapshot`]s. Never fails: provider
/// errors produce a snapshot with every metric unknown.
#[derive(Clone)]
pub struct MarketDataFetcher {
    provider: Arc<dyn MarketDataProvider>,
    timeout: Duration,
}

impl MarketDataFetcher {
    pub fn new(provider: Arc<dyn MarketDataProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub async fn fetch(&self, ticker: &TickerSymbol) -> StockSnapshot {
        self.try_fetch(ticker)
            .await
            .unwrap_or_else(|| StockSnapshot::unavailable(ticker.as_str()))
    }

    /// Like [`fetch`](Self::fetch), but `None` when the provider failed or
    /// timed out, so callers can tell a fallback from real data.
    pub(crate) async fn try_fetch(&self, ticker: &TickerSymbol) -> Option<StockSnapshot> {
        info!("[MarketData] Fetching stock data for {}", ticker);

        let result = match tokio::time::timeout(self.timeout, self.provider.fetch_quote(ticker.as_str())).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout),
        };

        match result {
            Ok(quote) => {
                let snapshot = snapshot_from_quote(ticker.as_str(), &quote);
                info!(
                    "[MarketData] {} ({}) price: {:?}",
                    ticker, snapshot.company_name, snapshot.metrics.price
                );
                Some(snapshot)
            }
            Err(e) => {
                warn!("[MarketData] Falling back to unknown metrics for {}: {}", ticker, e);
                None
            }
        }
    }
}

/// Normalize a provider quote into the public metrics shape.
pub fn snapshot_from_quote(ticker: &str, quote: &ProviderQuote) -> StockSnapshot {
    let price = quote.price();
    let prev_close = quote.prev_close();
    let week_52_high = quote.fifty_two_week_high;
    let target_price = quote.target_mean_price;

    let price_change = match (price, prev_close) {
        (Some(price), Some(prev)) => Some(price - prev),
        _ => None,
    };

    let metrics = StockMetrics {
        price,
        price_change: price_change.map(round2),
        price_change_pct: price_change.and_then(|change| percent_of(change, prev_close)),
        prev_close,
        week_52_high,
        week_52_low: quote.fifty_two_week_low,
        pct_from_high: relative_change(price, week_52_high),
        market_cap: quote.market_cap.map(format_market_cap),
        pe_ratio: quote.trailing_pe.map(round2),
        forward_pe: quote.forward_pe.map(round2),
        volume_vs_avg: quote
            .last_volume()
            .and_then(|volume| percent_of(volume, quote.average_volume)),
        beta: quote.beta.map(round2),
        short_percent: quote.short_percent_of_float.map(fraction_to_percent),
        debt_to_equity: quote.debt_to_equity.map(round2),
        current_ratio: quote.current_ratio.map(round2),
        profit_margin: quote.profit_margins.map(fraction_to_percent),
        revenue_growth: quote.revenue_growth.map(fraction_to_percent),
        earnings_growth: quote.earnings_growth.map(fraction_to_percent),
        target_price,
        target_upside: relative_change(target_price, price),
        recommendation: quote.recommendation_key.clone(),
    };

    StockSnapshot {
        company_name: quote
            .company_name()
            .map(str::to_string)
            .unwrap_or_else(|| ticker.to_string()),
        metrics,
    }
}

/// `value / base * 100`, or `None` when the base is unknown or zero.
fn percent_of(value: f64, base: Option<f64>) -> Option<f64> {
    let base = base.filter(|b| *b != 0.0)?;
    let pct = value / base * 100.0;
    pct.is_finite().then(|| round2(pct))
}

/// `(value - base) / base * 100` with the same guards as [`percent_of`].
fn relative_change(value: Option<f64>, base: Option<f64>) -> Option<f64> {
    percent_of(value? - base?, base)
}

fn fraction_to_percent(fraction: f64) -> f64 {
    round2(fraction * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn format_market_cap(value: f64) -> String {
    const TRILLION: f64 = 1e12;
    const BILLION: f64 = 1e9;
    const MILLION: f64 = 1e6;

    if value >= TRILLION {
        format!("${:.2}T", value / TRILLION)
    } else if value >= BILLION {
        format!("${:.2}B", value / BILLION)
    } else if value >= MILLION {
        format!("${:.2}M", value / MILLION)
    } else {
        format!("${:.0}", value)
    }
}
