use super::ticker::Ticker;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Price position relative to the 20-EMA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Above,
    Below,
}

impl Side {
    /// Strictly greater is `Above`; an exact tie counts as `Below`.
    pub fn classify(price: f64, ema20: f64) -> Self {
        if price > ema20 {
            Side::Above
        } else {
            Side::Below
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Above => "above",
            Side::Below => "below",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last observed side per ticker. Entries outlive watchlist removal.
pub type StatusMap = BTreeMap<Ticker, Side>;

/// Latest price and 20-EMA for a ticker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub price: f64,
    pub ema20: f64,
}

impl Observation {
    pub fn new(price: f64, ema20: f64) -> Self {
        Self { price, ema20 }
    }

    pub fn side(&self) -> Side {
        Side::classify(self.price, self.ema20)
    }
}

/// Emitted when a ticker's side differs from the recorded one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub ticker: Ticker,
    pub price: f64,
    pub ema20: f64,
    pub side: Side,
}

/// All transitions from one tick, delivered as a single notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionBatch {
    pub events: Vec<TransitionEvent>,
    pub produced_at: DateTime<Utc>,
}

impl TransitionBatch {
    pub fn new(events: Vec<TransitionEvent>) -> Self {
        Self {
            events,
            produced_at: Utc::now(),
        }
    }
}

/// Row of the on-demand quote snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub ticker: Ticker,
    pub price: f64,
    pub ema20: f64,
}
