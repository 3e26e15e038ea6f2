use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tracing::{info, warn};

use crate::errors::LlmError;
use crate::models::{NewsItem, Rating, StockMetrics, TickerSymbol, Verdict};
use crate::services::llm_service::{AnthropicProvider, LlmConfig, LlmProvider};

const SYSTEM_PROMPT: &str = "You are HedgeAI, a skeptical buy-side risk analyst. \
Your job is to find the reasons NOT to own a stock: valuation stretch, balance-sheet strain, \
slowing growth, crowded positioning and negative news flow. Be specific, cite the numbers you \
are given, and never invent figures. Do not give personalised financial advice.";

// "VERDICT: BEARISH", "**Verdict:** neutral", "VERDICT: **BEARISH**"
static VERDICT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bVERDICT\b[*_\s]*:[*_\s]*([A-Za-z]+)").expect("verdict pattern is valid")
});

/// Extract the rating from free-form model output.
///
/// Takes the first `VERDICT:` marker whose token is a known rating; anything
/// else (no marker, unknown token) is NEUTRAL.
pub fn parse_rating(text: &str) -> Rating {
    VERDICT_MARKER
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .find_map(|token| Rating::from_token(token.as_str()))
        .unwrap_or_default()
}

/// Build the user prompt. Same inputs always produce the same text.
pub fn build_prompt(ticker: &TickerSymbol, company_name: &str, metrics: &StockMetrics, news: &[NewsItem]) -> String {
    format!(
        "Analyze {company} ({ticker}) for investment risks.

MARKET DATA:
- Price: {price}
- Change vs previous close: {change} ({change_pct})
- Previous close: {prev_close}
- 52-week range: {low} - {high} ({from_high} from high)
- Market cap: {market_cap}

VALUATION & RISK:
- Trailing P/E: {pe}
- Forward P/E: {forward_pe}
- Beta: {beta}
- Short interest (% of float): {short_percent}
- Volume vs average: {volume_vs_avg}

FUNDAMENTALS:
- Debt to equity: {debt_to_equity}
- Current ratio: {current_ratio}
- Profit margin: {profit_margin}
- Revenue growth: {revenue_growth}
- Earnings growth: {earnings_growth}

ANALYST VIEW:
- Mean target: {target} ({upside} upside)
- Consensus: {consensus}

RECENT NEWS:
{news}

Write a concise risk assessment (under 300 words) covering the three most \
important risks, each tied to the data above. Values marked N/A are unavailable; do not guess them.
End with exactly one final line: **VERDICT: BEARISH** if the risks dominate, \
otherwise **VERDICT: NEUTRAL**.",
        company = company_name,
        ticker = ticker,
        price = money(metrics.price),
        change = money(metrics.price_change),
        change_pct = number(metrics.price_change_pct, "%"),
        prev_close = money(metrics.prev_close),
        low = money(metrics.week_52_low),
        high = money(metrics.week_52_high),
        from_high = number(metrics.pct_from_high, "%"),
        market_cap = text(metrics.market_cap.as_deref()),
        pe = number(metrics.pe_ratio, ""),
        forward_pe = number(metrics.forward_pe, ""),
        beta = number(metrics.beta, ""),
        short_percent = number(metrics.short_percent, "%"),
        volume_vs_avg = number(metrics.volume_vs_avg, "%"),
        debt_to_equity = number(metrics.debt_to_equity, ""),
        current_ratio = number(metrics.current_ratio, ""),
        profit_margin = number(metrics.profit_margin, "%"),
        revenue_growth = number(metrics.revenue_growth, "%"),
        earnings_growth = number(metrics.earnings_growth, "%"),
        target = money(metrics.target_price),
        upside = number(metrics.target_upside, "%"),
        consensus = text(metrics.recommendation.as_deref()),
        news = news_digest(news),
    )
}

fn news_digest(news: &[NewsItem]) -> String {
    if news.is_empty() {
        return "No recent news available.".to_string();
    }
    news.iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {} - {}", i + 1, item.title, item.source))
        .collect::<Vec<_>>()
        .join("\n")
}

fn money(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("${:.2}", v))
}

fn number(value: Option<f64>, suffix: &str) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.2}{}", v, suffix))
}

fn text(value: Option<&str>) -> &str {
    value.unwrap_or("N/A")
}

/// Turns metrics and news into a rated risk assessment via the LLM.
#[derive(Clone)]
pub struct VerdictGenerator {
    provider: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl VerdictGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Build the Anthropic-backed generator; fails when no API key is configured.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let provider = AnthropicProvider::new(config)?;
        info!("Verdict generator ready (model: {})", config.model);
        Ok(Self::new(Arc::new(provider), config.timeout))
    }

    pub async fn generate(
        &self,
        ticker: &TickerSymbol,
        company_name: &str,
        metrics: &StockMetrics,
        news: &[NewsItem],
    ) -> Result<Verdict, LlmError> {
        let prompt = build_prompt(ticker, company_name, metrics, news);

        let analysis = tokio::time::timeout(self.timeout, self.provider.generate_completion(SYSTEM_PROMPT, prompt))
            .await
            .map_err(|_| {
                warn!("[Verdict] LLM call for {} timed out after {:?}", ticker, self.timeout);
                LlmError::Timeout
            })??;

        let rating = parse_rating(&analysis);
        info!("[Verdict] {} rated {}", ticker, rating);

        Ok(Verdict { analysis, rating })
    }
}
