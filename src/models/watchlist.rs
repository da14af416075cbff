use super::ticker::Ticker;
use serde::{Deserialize, Serialize};

/// Ordered set of tickers. Insertion order is kept for display.
///
/// Persisted as a plain JSON array; duplicates in a loaded file are dropped,
/// keeping the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Ticker>", into = "Vec<Ticker>")]
pub struct Watchlist {
    tickers: Vec<Ticker>,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `ticker` unless already present. Returns whether it was added.
    pub fn insert(&mut self, ticker: Ticker) -> bool {
        if self.contains(&ticker) {
            return false;
        }
        self.tickers.push(ticker);
        true
    }

    /// Removes `ticker`, returning whether it was present.
    pub fn remove(&mut self, ticker: &Ticker) -> bool {
        let before = self.tickers.len();
        self.tickers.retain(|t| t != ticker);
        self.tickers.len() != before
    }

    pub fn contains(&self, ticker: &Ticker) -> bool {
        self.tickers.iter().any(|t| t == ticker)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Ticker> {
        self.tickers.iter()
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    pub fn as_slice(&self) -> &[Ticker] {
        &self.tickers
    }
}

impl From<Vec<Ticker>> for Watchlist {
    fn from(tickers: Vec<Ticker>) -> Self {
        let mut watchlist = Self::new();
        for ticker in tickers {
            watchlist.insert(ticker);
        }
        watchlist
    }
}

impl From<Watchlist> for Vec<Ticker> {
    fn from(watchlist: Watchlist) -> Self {
        watchlist.tickers
    }
}

impl<'a> IntoIterator for &'a Watchlist {
    type Item = &'a Ticker;
    type IntoIter = std::slice::Iter<'a, Ticker>;

    fn into_iter(self) -> Self::IntoIter {
        self.tickers.iter()
    }
}
