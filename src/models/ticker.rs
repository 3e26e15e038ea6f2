use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest symbol the analyze endpoint accepts.
pub const MAX_TICKER_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickerError {
    #[error("Ticker symbol is empty")]
    Empty,
    #[error("Ticker symbol is {len} characters long (max {max})")]
    TooLong { len: usize, max: usize },
    #[error("Invalid ticker format. Only letters, numbers, dots and hyphens allowed.")]
    InvalidChar { ch: char },
}

/// Canonical exchange symbol: uppercase ASCII letters, digits, `.` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TickerSymbol(String);

impl TickerSymbol {
    /// Trim and uppercase `input`, then check it against `^[A-Z0-9.\-]+$`.
    pub fn parse(input: &str) -> Result<Self, TickerError> {
        let normalized = input.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(TickerError::Empty);
        }

        let len = normalized.chars().count();
        if len > MAX_TICKER_LEN {
            return Err(TickerError::TooLong {
                len,
                max: MAX_TICKER_LEN,
            });
        }

        if let Some(ch) = normalized
            .chars()
            .find(|ch| !(ch.is_ascii_uppercase() || ch.is_ascii_digit() || *ch == '.' || *ch == '-'))
        {
            return Err(TickerError::InvalidChar { ch });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TickerSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TickerSymbol {
    type Error = TickerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TickerSymbol> for String {
    fn from(value: TickerSymbol) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let ticker = TickerSymbol::parse("  brk.b ").unwrap();
        assert_eq!(ticker.as_str(), "BRK.B");
    }

    #[test]
    fn test_parse_rejects_special_characters() {
        assert!(matches!(
            TickerSymbol::parse("INVALID@TICKER"),
            Err(TickerError::TooLong { .. })
        ));
        assert!(matches!(
            TickerSymbol::parse("AB@C"),
            Err(TickerError::InvalidChar { ch: '@' })
        ));
        assert!(matches!(
            TickerSymbol::parse("TEST<"),
            Err(TickerError::InvalidChar { ch: '<' })
        ));
    }

    #[test]
    fn test_parse_rejects_empty_and_long_symbols() {
        assert_eq!(TickerSymbol::parse("   "), Err(TickerError::Empty));
        assert!(TickerSymbol::parse("ABCDEFGHIJ").is_ok());
        assert!(matches!(
            TickerSymbol::parse("ABCDEFGHIJK"),
            Err(TickerError::TooLong { len: 11, max: 10 })
        ));
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let parsed: TickerSymbol = serde_json::from_str("\"rds-a\"").unwrap();
        assert_eq!(parsed.as_str(), "RDS-A");
        assert!(serde_json::from_str::<TickerSymbol>("\"A B\"").is_err());
    }
}
