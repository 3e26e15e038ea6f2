use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{NewsItem, StockMetrics, TickerSymbol};

/// Qualitative risk rating extracted from the model's answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Rating {
    Bearish,
    #[default]
    Neutral,
}

impl Rating {
    /// Case-insensitive lookup of a verdict token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "BEARISH" => Some(Rating::Bearish),
            "NEUTRAL" => Some(Rating::Neutral),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Bearish => "BEARISH",
            Rating::Neutral => "NEUTRAL",
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw model output together with the rating parsed from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub analysis: String,
    pub rating: Rating,
}

/// Response body of `GET /v1/api/analyze/{query}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ticker: TickerSymbol,
    pub company_name: String,
    pub rating: Rating,
    pub metrics: StockMetrics,
    pub news: Vec<NewsItem>,
    pub analysis: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_tokens_are_case_insensitive() {
        assert_eq!(Rating::from_token("bearish"), Some(Rating::Bearish));
        assert_eq!(Rating::from_token(" Neutral "), Some(Rating::Neutral));
        assert_eq!(Rating::from_token("BULLISH"), None);
    }

    #[test]
    fn test_rating_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Rating::Bearish).unwrap(), "\"BEARISH\"");
        assert_eq!(Rating::default(), Rating::Neutral);
    }
}
