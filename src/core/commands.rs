//! Watchlist commands shared by every front end

use crate::error::StoreError;
use crate::metrics::Metrics;
use crate::models::{Quote, StatusMap, Ticker, Watchlist};
use crate::services::market_data::{fetch_in_order, IndicatorProvider};
use crate::signals::DEFAULT_FETCH_CONCURRENCY;
use crate::store::{StatusStore, WatchlistStore};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added(Ticker),
    AlreadyPresent(Ticker),
    /// Rejected by syntax or by the provider; carries a human-readable reason.
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed(Ticker),
    NotFound,
}

pub struct WatchlistService {
    watchlist: Arc<WatchlistStore>,
    status: Arc<StatusStore>,
    provider: Arc<dyn IndicatorProvider>,
    fetch_concurrency: usize,
    metrics: Option<Arc<Metrics>>,
}

impl WatchlistService {
    pub fn new(
        watchlist: Arc<WatchlistStore>,
        status: Arc<StatusStore>,
        provider: Arc<dyn IndicatorProvider>,
    ) -> Self {
        Self {
            watchlist,
            status,
            provider,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            metrics: None,
        }
    }

    pub fn with_fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.fetch_concurrency = concurrency.max(1);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Validate `raw` against the provider and append it to the watchlist.
    ///
    /// The provider round-trip happens without holding the watchlist lock;
    /// membership is checked again under the lock before saving.
    pub async fn add_ticker(&self, raw: &str) -> Result<AddOutcome, StoreError> {
        let ticker = match Ticker::parse(raw) {
            Ok(ticker) => ticker,
            Err(e) => return Ok(AddOutcome::Invalid(e.to_string())),
        };

        if self.watchlist.snapshot().await?.contains(&ticker) {
            return Ok(AddOutcome::AlreadyPresent(ticker));
        }

        if let Err(e) = self.provider.fetch(&ticker).await {
            warn!(ticker = %ticker, error = %e, "WatchlistService: rejecting {}", ticker);
            return Ok(AddOutcome::Invalid(format!("no data for {}", ticker)));
        }

        let mut watchlist = self.watchlist.lock().await?;
        if !watchlist.insert(ticker.clone()) {
            return Ok(AddOutcome::AlreadyPresent(ticker));
        }
        let watchlist = watchlist.commit().await?;
        self.record_size(&watchlist);

        info!(ticker = %ticker, size = watchlist.len(), "WatchlistService: added {}", ticker);
        Ok(AddOutcome::Added(ticker))
    }

    /// Remove a ticker. Its recorded side is kept.
    pub async fn delete_ticker(&self, raw: &str) -> Result<DeleteOutcome, StoreError> {
        let Ok(ticker) = Ticker::parse(raw) else {
            return Ok(DeleteOutcome::NotFound);
        };

        let mut watchlist = self.watchlist.lock().await?;
        if !watchlist.remove(&ticker) {
            return Ok(DeleteOutcome::NotFound);
        }
        let watchlist = watchlist.commit().await?;
        self.record_size(&watchlist);

        info!(ticker = %ticker, size = watchlist.len(), "WatchlistService: removed {}", ticker);
        Ok(DeleteOutcome::Removed(ticker))
    }

    pub async fn list(&self) -> Result<Watchlist, StoreError> {
        self.watchlist.snapshot().await
    }

    /// Current price and 20-EMA for every ticker that can be fetched, in
    /// watchlist order. Does not read or touch the status map.
    pub async fn query_all(&self) -> Result<Vec<Quote>, StoreError> {
        let watchlist = self.watchlist.snapshot().await?;
        let fetched = fetch_in_order(
            self.provider.as_ref(),
            watchlist.iter().cloned(),
            self.fetch_concurrency,
        )
        .await;

        Ok(fetched
            .into_iter()
            .filter_map(|(ticker, result)| match result {
                Ok(observation) => Some(Quote {
                    ticker,
                    price: observation.price,
                    ema20: observation.ema20,
                }),
                Err(e) => {
                    warn!(ticker = %ticker, error = %e, "WatchlistService: no quote for {}", ticker);
                    None
                }
            })
            .collect())
    }

    pub async fn status(&self) -> Result<StatusMap, StoreError> {
        self.status.snapshot().await
    }

    fn record_size(&self, watchlist: &Watchlist) {
        if let Some(ref metrics) = self.metrics {
            metrics.watchlist_size.set(watchlist.len() as i64);
        }
    }
}
