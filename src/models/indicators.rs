use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closing price of one bar in a price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub close: f64,
    pub timestamp: DateTime<Utc>,
}

impl Candle {
    pub fn new(close: f64, timestamp: DateTime<Utc>) -> Self {
        Self { close, timestamp }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmaIndicator {
    pub value: f64,
    pub period: u32,
}
