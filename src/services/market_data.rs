//! Indicator provider interface and an in-memory implementation.

use crate::error::ProviderError;
use crate::models::{Observation, Ticker};
use futures_util::{stream, StreamExt};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Source of the latest price and 20-EMA for a ticker.
///
/// Unknown or delisted symbols must come back as an error for that ticker
/// only; callers treat every error as "unavailable".
#[async_trait::async_trait]
pub trait IndicatorProvider: Send + Sync {
    async fn fetch(&self, ticker: &Ticker) -> Result<Observation, ProviderError>;
}

/// Fetch every ticker with at most `concurrency` requests outstanding.
///
/// Results come back in input order regardless of completion order.
pub async fn fetch_in_order<I>(
    provider: &dyn IndicatorProvider,
    tickers: I,
    concurrency: usize,
) -> Vec<(Ticker, Result<Observation, ProviderError>)>
where
    I: IntoIterator<Item = Ticker>,
{
    stream::iter(tickers)
        .map(|ticker| async move {
            let result = provider.fetch(&ticker).await;
            (ticker, result)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// Provider backed by a mutable in-memory table.
///
/// Useful for offline runs and tests: tickers without an entry are unavailable.
#[derive(Default)]
pub struct StaticIndicatorProvider {
    observations: RwLock<HashMap<Ticker, Observation>>,
}

impl StaticIndicatorProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, ticker: &Ticker, price: f64, ema20: f64) {
        self.observations
            .write()
            .await
            .insert(ticker.clone(), Observation::new(price, ema20));
    }

    pub async fn remove(&self, ticker: &Ticker) {
        self.observations.write().await.remove(ticker);
    }
}

#[async_trait::async_trait]
impl IndicatorProvider for StaticIndicatorProvider {
    async fn fetch(&self, ticker: &Ticker) -> Result<Observation, ProviderError> {
        self.observations
            .read()
            .await
            .get(ticker)
            .copied()
            .ok_or_else(|| ProviderError::Unavailable(ticker.to_string()))
    }
}
