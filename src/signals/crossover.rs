//! Price / 20-EMA crossover detection.
//!
//! [`detect_transitions`] is the pure state machine; [`CrossoverEngine`]
//! wraps it with the watchlist, the indicator provider, the status store and
//! the notification channel.

use crate::error::{StoreError, TickError};
use crate::metrics::Metrics;
use crate::models::{Observation, StatusMap, Ticker, TransitionBatch, TransitionEvent};
use crate::services::market_data::{fetch_in_order, IndicatorProvider};
use crate::store::{StatusStore, WatchlistStore};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const DEFAULT_FETCH_CONCURRENCY: usize = 4;

/// What one pass over the observations changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickOutcome {
    /// Transitions, in watchlist order.
    pub events: Vec<TransitionEvent>,
    /// Tickers seen for the first time; their side was recorded silently.
    pub first_seen: Vec<Ticker>,
    /// Tickers with no observation this tick; their status is untouched.
    pub skipped: Vec<Ticker>,
}

/// Compare each observation against `status`, updating it in place.
///
/// `None` observations are skipped without touching `status`.
pub fn detect_transitions<I>(status: &mut StatusMap, observations: I) -> TickOutcome
where
    I: IntoIterator<Item = (Ticker, Option<Observation>)>,
{
    let mut outcome = TickOutcome::default();

    for (ticker, observation) in observations {
        let Some(observation) = observation else {
            outcome.skipped.push(ticker);
            continue;
        };

        let side = observation.side();
        match status.insert(ticker.clone(), side) {
            None => outcome.first_seen.push(ticker),
            Some(previous) if previous == side => {}
            Some(_) => outcome.events.push(TransitionEvent {
                ticker,
                price: observation.price,
                ema20: observation.ema20,
                side,
            }),
        }
    }

    outcome
}

/// Result of a completed tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub events: Vec<TransitionEvent>,
    pub status: StatusMap,
    pub first_seen: Vec<Ticker>,
    pub skipped: Vec<Ticker>,
}

pub struct CrossoverEngine {
    provider: Arc<dyn IndicatorProvider>,
    watchlist: Arc<WatchlistStore>,
    status: Arc<StatusStore>,
    batches: mpsc::Sender<TransitionBatch>,
    fetch_concurrency: usize,
    in_flight: AtomicBool,
    last_tick_failed: AtomicBool,
    metrics: Option<Arc<Metrics>>,
}

impl CrossoverEngine {
    pub fn new(
        provider: Arc<dyn IndicatorProvider>,
        watchlist: Arc<WatchlistStore>,
        status: Arc<StatusStore>,
        batches: mpsc::Sender<TransitionBatch>,
    ) -> Self {
        Self {
            provider,
            watchlist,
            status,
            batches,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            in_flight: AtomicBool::new(false),
            last_tick_failed: AtomicBool::new(false),
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

    /// Whether a tick is executing right now.
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Whether the most recent completed tick failed to persist the status map.
    pub fn last_tick_failed(&self) -> bool {
        self.last_tick_failed.load(Ordering::SeqCst)
    }

    /// Run one crossover tick.
    ///
    /// Returns [`TickError::Busy`] immediately if another tick is in flight.
    /// Per-ticker fetch failures never fail the tick; only a status store
    /// failure does, in which case the caller must assume nothing was saved.
    pub async fn run_tick(&self) -> Result<TickReport, TickError> {
        let Some(_permit) = InFlight::acquire(&self.in_flight) else {
            debug!("CrossoverEngine: tick already in flight, skipping");
            if let Some(ref metrics) = self.metrics {
                metrics.ticks_skipped_total.inc();
            }
            return Err(TickError::Busy);
        };

        let start = Instant::now();
        let result = self.tick().await;
        self.last_tick_failed.store(result.is_err(), Ordering::SeqCst);

        if let Some(ref metrics) = self.metrics {
            metrics
                .tick_duration_seconds
                .observe(start.elapsed().as_secs_f64());
            match &result {
                Ok(report) => {
                    metrics.ticks_total.inc();
                    metrics.transitions_total.inc_by(report.events.len() as u64);
                }
                Err(_) => metrics.ticks_failed_total.inc(),
            }
        }

        result.map_err(TickError::from)
    }

    async fn tick(&self) -> Result<TickReport, StoreError> {
        let watchlist = self.watchlist.snapshot().await?;
        if let Some(ref metrics) = self.metrics {
            metrics.watchlist_size.set(watchlist.len() as i64);
        }

        let fetched = fetch_in_order(
            self.provider.as_ref(),
            watchlist.iter().cloned(),
            self.fetch_concurrency,
        )
        .await;

        let observations: Vec<(Ticker, Option<Observation>)> = fetched
            .into_iter()
            .map(|(ticker, result)| match result {
                Ok(observation) => (ticker, Some(observation)),
                Err(e) => {
                    warn!(ticker = %ticker, error = %e, "CrossoverEngine: skipping {}", ticker);
                    if let Some(ref metrics) = self.metrics {
                        metrics.fetch_failures_total.inc();
                    }
                    (ticker, None)
                }
            })
            .collect();

        // Wait for notification capacity before taking the status lock, so a
        // slow notifier never blocks status readers.
        let slot = self.reserve_slot().await;

        let mut status = self.status.lock().await?;
        let outcome = detect_transitions(&mut status, observations);

        if !outcome.events.is_empty() {
            let batch = TransitionBatch::new(outcome.events.clone());
            match slot {
                Some(slot) => slot.send(batch),
                None => self.batch_dropped(batch.events.len()),
            }
        }

        let status = status.commit().await?;

        info!(
            tickers = watchlist.len(),
            transitions = outcome.events.len(),
            first_seen = outcome.first_seen.len(),
            skipped = outcome.skipped.len(),
            "CrossoverEngine: tick complete, {} transitions across {} tickers",
            outcome.events.len(),
            watchlist.len()
        );

        Ok(TickReport {
            events: outcome.events,
            status,
            first_seen: outcome.first_seen,
            skipped: outcome.skipped,
        })
    }

    async fn reserve_slot(&self) -> Option<mpsc::Permit<'_, TransitionBatch>> {
        match self.batches.reserve().await {
            Ok(permit) => Some(permit),
            Err(_) => {
                debug!("CrossoverEngine: notification channel closed");
                None
            }
        }
    }

    fn batch_dropped(&self, count: usize) {
        warn!(
            transitions = count,
            "CrossoverEngine: notification channel closed, batch dropped"
        );
        if let Some(ref metrics) = self.metrics {
            metrics.notification_failures_total.inc();
        }
    }
}

/// Holds the in-flight flag for the duration of a tick.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
