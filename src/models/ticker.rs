//! Normalised ticker symbols

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MAX_TICKER_LEN: usize = 20;

/// Characters allowed besides ASCII alphanumerics (`^GSPC`, `BRK-B`, `EURUSD=X`, `M&M.NS`).
const SYMBOL_PUNCTUATION: &[char] = &['.', '-', '^', '=', '&'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickerError {
    #[error("ticker is empty")]
    Empty,
    #[error("ticker {0:?} is longer than {max} characters", max = MAX_TICKER_LEN)]
    TooLong(String),
    #[error("ticker {0:?} contains invalid character {1:?}")]
    InvalidCharacter(String, char),
}

/// A trimmed, uppercase, non-empty symbol. Equality is plain string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    pub fn parse(raw: &str) -> Result<Self, TickerError> {
        let symbol = raw.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(TickerError::Empty);
        }
        if symbol.chars().count() > MAX_TICKER_LEN {
            return Err(TickerError::TooLong(symbol));
        }
        if let Some(bad) = symbol
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !SYMBOL_PUNCTUATION.contains(c))
        {
            return Err(TickerError::InvalidCharacter(symbol, bad));
        }
        Ok(Self(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Ticker {
    type Err = TickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = TickerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
