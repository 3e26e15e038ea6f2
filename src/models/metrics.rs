use serde::{Deserialize, Serialize};

/// Quote and fundamental figures for one ticker.
///
/// `None` is the only "unknown" marker: numeric fields that the provider did
/// not report (or reported as a placeholder) are `None` and serialize as
/// `null`. Percentages are expressed in percent, not as fractions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockMetrics {
    pub price: Option<f64>,
    pub price_change: Option<f64>,
    pub price_change_pct: Option<f64>,
    pub prev_close: Option<f64>,
    pub week_52_high: Option<f64>,
    pub week_52_low: Option<f64>,
    pub pct_from_high: Option<f64>,
    /// Human-readable capitalization such as `$2.50T`.
    pub market_cap: Option<String>,
    pub pe_ratio: Option<f64>,
    pub forward_pe: Option<f64>,
    /// Latest volume as a percentage of the average daily volume.
    pub volume_vs_avg: Option<f64>,
    pub beta: Option<f64>,
    pub short_percent: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub profit_margin: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,
    pub target_price: Option<f64>,
    pub target_upside: Option<f64>,
    pub recommendation: Option<String>,
}

impl StockMetrics {
    /// Metrics with every field unknown.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn is_unavailable(&self) -> bool {
        *self == Self::default()
    }
}

/// What the market data fetcher produces and the metrics cache stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub company_name: String,
    pub metrics: StockMetrics,
}

impl StockSnapshot {
    /// Placeholder used when the provider could not be reached.
    pub fn unavailable(ticker: &str) -> Self {
        Self {
            company_name: ticker.to_string(),
            metrics: StockMetrics::unavailable(),
        }
    }
}
