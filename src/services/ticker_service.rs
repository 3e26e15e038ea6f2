use tracing::debug;

use crate::errors::AppError;
use crate::models::TickerSymbol;

/// Company names (lowercase) and the symbol they trade under.
///
/// No name may equal the lowercase form of a *different* symbol in this table,
/// otherwise resolving a resolved symbol would change it.
const COMPANY_TICKERS: &[(&str, &str)] = &[
    ("apple", "AAPL"),
    ("microsoft", "MSFT"),
    ("google", "GOOGL"),
    ("alphabet", "GOOGL"),
    ("amazon", "AMZN"),
    ("nvidia", "NVDA"),
    ("tesla", "TSLA"),
    ("meta", "META"),
    ("facebook", "META"),
    ("netflix", "NFLX"),
    ("intel", "INTC"),
    ("amd", "AMD"),
    ("advanced micro devices", "AMD"),
    ("ibm", "IBM"),
    ("oracle", "ORCL"),
    ("salesforce", "CRM"),
    ("adobe", "ADBE"),
    ("cisco", "CSCO"),
    ("qualcomm", "QCOM"),
    ("broadcom", "AVGO"),
    ("palantir", "PLTR"),
    ("snowflake", "SNOW"),
    ("shopify", "SHOP"),
    ("spotify", "SPOT"),
    ("uber", "UBER"),
    ("airbnb", "ABNB"),
    ("paypal", "PYPL"),
    ("coinbase", "COIN"),
    ("visa", "V"),
    ("mastercard", "MA"),
    ("jpmorgan", "JPM"),
    ("jp morgan", "JPM"),
    ("goldman sachs", "GS"),
    ("bank of america", "BAC"),
    ("berkshire hathaway", "BRK.B"),
    ("berkshire", "BRK.B"),
    ("walmart", "WMT"),
    ("costco", "COST"),
    ("target", "TGT"),
    ("home depot", "HD"),
    ("disney", "DIS"),
    ("nike", "NKE"),
    ("starbucks", "SBUX"),
    ("mcdonalds", "MCD"),
    ("mcdonald's", "MCD"),
    ("coca cola", "KO"),
    ("coca-cola", "KO"),
    ("pepsico", "PEP"),
    ("procter & gamble", "PG"),
    ("johnson & johnson", "JNJ"),
    ("pfizer", "PFE"),
    ("moderna", "MRNA"),
    ("exxon", "XOM"),
    ("exxonmobil", "XOM"),
    ("exxon mobil", "XOM"),
    ("chevron", "CVX"),
    ("boeing", "BA"),
    ("ford", "F"),
    ("general motors", "GM"),
    ("general electric", "GE"),
    ("verizon", "VZ"),
    ("at&t", "T"),
    ("gamestop", "GME"),
    ("amc", "AMC"),
];

/// Partial "name starts with query" matching needs at least this many characters.
const MIN_PREFIX_LEN: usize = 4;

/// Map a ticker or company name to a canonical symbol.
///
/// Resolution order: exact company name, then any input that already has
/// ticker syntax (returned uppercased), then partial company name for inputs
/// that cannot be a symbol ("Apple Inc.", "bank of"). Returns `None` when
/// nothing matches.
pub fn resolve_ticker(query: &str) -> Option<TickerSymbol> {
    let normalized = query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    if let Some((_, ticker)) = COMPANY_TICKERS
        .iter()
        .find(|(name, _)| *name == normalized)
    {
        return TickerSymbol::parse(ticker).ok();
    }

    if let Ok(symbol) = TickerSymbol::parse(&normalized) {
        return Some(symbol);
    }

    let ticker = partial_match(&normalized)?;
    debug!("Partial company match for '{}': {}", query, ticker);
    TickerSymbol::parse(ticker).ok()
}

fn partial_match(normalized: &str) -> Option<&'static str> {
    // "apple inc" -> apple
    let by_leading_name = COMPANY_TICKERS.iter().find(|(name, _)| {
        normalized
            .strip_prefix(name)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|next| !next.is_alphanumeric())
    });
    if let Some((_, ticker)) = by_leading_name {
        return Some(ticker);
    }

    // "bank of" -> bank of america
    if normalized.chars().count() >= MIN_PREFIX_LEN {
        return COMPANY_TICKERS
            .iter()
            .find(|(name, _)| name.starts_with(normalized))
            .map(|(_, ticker)| *ticker);
    }

    None
}

/// Resolve `query` or fail with a client-facing validation error.
pub fn resolve_and_validate(query: &str) -> Result<TickerSymbol, AppError> {
    resolve_ticker(query)
        .ok_or_else(|| AppError::Validation("Invalid ticker symbol or company name".to_string()))
}
