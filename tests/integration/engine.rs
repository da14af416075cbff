//! Integration tests for crossover ticks

use crate::test_utils::{status_of, t, Harness};
use emawatch::error::{ProviderError, TickError};
use emawatch::models::{
    Observation, Side, StatusMap, Ticker, TransitionBatch, TransitionEvent, Watchlist,
};
use emawatch::services::market_data::{IndicatorProvider, StaticIndicatorProvider};
use emawatch::signals::CrossoverEngine;
use emawatch::store::{JsonFileStore, LockedStore, Store};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{mpsc, Notify};
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn tick_reports_transition_and_records_first_sighting() {
    let mut h = Harness::new(&["AAA", "BBB"], &[("AAA", Side::Above)]);
    h.quote("AAA", 100.0, 105.0).await;
    h.quote("BBB", 50.0, 40.0).await;

    let report = assert_ok!(h.engine.run_tick().await);

    let expected = vec![TransitionEvent {
        ticker: t("AAA"),
        price: 100.0,
        ema20: 105.0,
        side: Side::Below,
    }];
    assert_eq!(report.events, expected);
    assert_eq!(report.first_seen, vec![t("BBB")]);
    assert_eq!(
        report.status,
        status_of(&[("AAA", Side::Below), ("BBB", Side::Above)])
    );
    assert_eq!(h.saved_status().await, report.status);

    let batches = h.drain_batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].events, expected);
}

#[tokio::test]
async fn second_tick_with_same_prices_is_silent() {
    let mut h = Harness::new(&["AAA", "BBB"], &[("AAA", Side::Above)]);
    h.quote("AAA", 100.0, 105.0).await;
    h.quote("BBB", 50.0, 40.0).await;

    h.engine.run_tick().await.unwrap();
    h.drain_batches();
    let before = h.saved_status().await;

    let report = h.engine.run_tick().await.unwrap();
    assert!(report.events.is_empty());
    assert!(h.drain_batches().is_empty());
    assert_eq!(h.saved_status().await, before);
}

#[tokio::test]
async fn status_is_saved_every_tick_even_without_events() {
    let h = Harness::new(&[], &[]);
    let report = h.engine.run_tick().await.unwrap();

    assert!(report.events.is_empty());
    assert_eq!(h.status_store.save_count(), 1);
}

#[tokio::test]
async fn unavailable_ticker_does_not_affect_others() {
    let mut h = Harness::new(
        &["AAA", "BBB", "CCC"],
        &[
            ("AAA", Side::Above),
            ("BBB", Side::Above),
            ("CCC", Side::Below),
        ],
    );
    h.quote("AAA", 90.0, 100.0).await;
    h.quote("CCC", 110.0, 100.0).await;

    let report = h.engine.run_tick().await.unwrap();

    let tickers: Vec<Ticker> = report.events.iter().map(|e| e.ticker.clone()).collect();
    assert_eq!(tickers, vec![t("AAA"), t("CCC")]);
    assert_eq!(report.skipped, vec![t("BBB")]);
    assert_eq!(report.status.get(&t("BBB")), Some(&Side::Above));
    assert_eq!(h.metrics.fetch_failures_total.get(), 1);
    assert_eq!(h.drain_batches().len(), 1);
}

#[tokio::test]
async fn failed_save_surfaces_and_next_tick_retries() {
    let mut h = Harness::new(&["AAA"], &[("AAA", Side::Above)]);
    h.quote("AAA", 90.0, 100.0).await;
    h.status_store.set_fail_writes(true);

    let err = assert_err!(h.engine.run_tick().await);
    assert!(matches!(err, TickError::Store(_)));
    assert_eq!(h.saved_status().await, status_of(&[("AAA", Side::Above)]));
    assert_eq!(h.metrics.ticks_failed_total.get(), 1);
    // Notification goes out before the save is attempted.
    assert_eq!(h.drain_batches().len(), 1);

    h.status_store.set_fail_writes(false);
    let report = h.engine.run_tick().await.unwrap();
    assert_eq!(report.events.len(), 1);
    assert_eq!(h.saved_status().await, status_of(&[("AAA", Side::Below)]));
}

#[tokio::test]
async fn removed_ticker_keeps_its_side_for_re_add() {
    let mut h = Harness::new(&["AAA"], &[]);
    h.quote("AAA", 110.0, 100.0).await;
    h.engine.run_tick().await.unwrap();

    {
        let mut watchlist = h.watchlist.lock().await.unwrap();
        watchlist.remove(&t("AAA"));
        watchlist.commit().await.unwrap();
    }
    h.engine.run_tick().await.unwrap();
    assert_eq!(h.saved_status().await.get(&t("AAA")), Some(&Side::Above));

    {
        let mut watchlist = h.watchlist.lock().await.unwrap();
        watchlist.insert(t("AAA"));
        watchlist.commit().await.unwrap();
    }
    h.quote("AAA", 90.0, 100.0).await;
    let report = h.engine.run_tick().await.unwrap();

    assert_eq!(report.events.len(), 1);
    assert!(report.first_seen.is_empty());
    h.drain_batches();
}

#[tokio::test]
async fn fresh_engine_over_same_files_does_not_refire() {
    let dir = TempDir::new().unwrap();
    let watchlist_path = dir.path().join("tickers.json");
    let status_path = dir.path().join("status.json");

    JsonFileStore::<Watchlist>::new(&watchlist_path)
        .save(&vec![t("AAA"), t("BBB")].into())
        .await
        .unwrap();

    let provider = Arc::new(StaticIndicatorProvider::new());
    provider.set(&t("AAA"), 110.0, 100.0).await;
    provider.set(&t("BBB"), 90.0, 100.0).await;

    let build = |tx: mpsc::Sender<TransitionBatch>| {
        CrossoverEngine::new(
            provider.clone(),
            Arc::new(LockedStore::new(Arc::new(JsonFileStore::<Watchlist>::new(
                &watchlist_path,
            )))),
            Arc::new(LockedStore::new(Arc::new(JsonFileStore::<StatusMap>::new(
                &status_path,
            )))),
            tx,
        )
    };

    let (tx, mut rx) = mpsc::channel(4);
    let first = build(tx);
    first.run_tick().await.unwrap();
    provider.set(&t("AAA"), 95.0, 100.0).await;
    let report = first.run_tick().await.unwrap();
    assert_eq!(report.events.len(), 1);
    drop(first);
    assert!(rx.recv().await.is_some());
    assert!(rx.recv().await.is_none());

    let (tx, mut rx) = mpsc::channel(4);
    let second = build(tx);
    let report = second.run_tick().await.unwrap();
    assert!(report.events.is_empty());
    assert!(report.first_seen.is_empty());
    assert_eq!(
        report.status,
        status_of(&[("AAA", Side::Below), ("BBB", Side::Below)])
    );
    drop(second);
    assert!(rx.recv().await.is_none());
}

/// Holds every fetch until released.
struct GatedProvider {
    entered: Notify,
    release: Notify,
}

#[async_trait::async_trait]
impl IndicatorProvider for GatedProvider {
    async fn fetch(&self, _ticker: &Ticker) -> Result<Observation, ProviderError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(Observation::new(1.0, 2.0))
    }
}

#[tokio::test]
async fn concurrent_tick_is_rejected_as_busy() {
    let h = Harness::new(&["AAA"], &[]);
    let provider = Arc::new(GatedProvider {
        entered: Notify::new(),
        release: Notify::new(),
    });
    let (tx, _rx) = mpsc::channel(4);
    let engine = Arc::new(
        CrossoverEngine::new(provider.clone(), h.watchlist.clone(), h.status.clone(), tx)
            .with_metrics(h.metrics.clone()),
    );

    let running = tokio::spawn({
        let engine = engine.clone();
        async move { engine.run_tick().await }
    });
    provider.entered.notified().await;
    assert!(engine.is_running());

    let second = engine.run_tick().await;
    assert!(matches!(second, Err(TickError::Busy)));
    assert_eq!(h.metrics.ticks_skipped_total.get(), 1);

    provider.release.notify_one();
    let first = running.await.unwrap().expect("first tick completes");
    assert_eq!(first.first_seen, vec![t("AAA")]);
    assert!(!engine.is_running());

    let again = tokio::spawn({
        let engine = engine.clone();
        async move { engine.run_tick().await }
    });
    provider.entered.notified().await;
    provider.release.notify_one();
    assert_ok!(again.await.unwrap());
}

#[tokio::test]
async fn metrics_track_ticks_and_transitions() {
    let mut h = Harness::new(&["AAA", "BBB"], &[("AAA", Side::Above), ("BBB", Side::Below)]);
    h.quote("AAA", 1.0, 2.0).await;
    h.quote("BBB", 3.0, 2.0).await;

    h.engine.run_tick().await.unwrap();
    h.drain_batches();

    assert_eq!(h.metrics.ticks_total.get(), 1);
    assert_eq!(h.metrics.transitions_total.get(), 2);
    assert_eq!(h.metrics.watchlist_size.get(), 2);
}

#[tokio::test]
async fn full_notification_channel_does_not_block_status_readers() {
    let h = Harness::new(&["AAA"], &[("AAA", Side::Above)]);
    h.quote("AAA", 90.0, 100.0).await;

    let (tx, mut rx) = mpsc::channel(1);
    tx.send(TransitionBatch::new(Vec::new())).await.unwrap();
    let engine = Arc::new(CrossoverEngine::new(
        h.provider.clone(),
        h.watchlist.clone(),
        h.status.clone(),
        tx,
    ));

    let running = tokio::spawn({
        let engine = engine.clone();
        async move { engine.run_tick().await }
    });
    while !engine.is_running() {
        tokio::task::yield_now().await;
    }
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    let status = tokio::time::timeout(Duration::from_secs(1), h.status.snapshot())
        .await
        .expect("status readable while the tick waits for the notifier");
    assert_eq!(status.unwrap(), status_of(&[("AAA", Side::Above)]));

    assert!(rx.recv().await.unwrap().events.is_empty());
    let report = assert_ok!(running.await.unwrap());
    assert_eq!(report.events.len(), 1);
    assert_eq!(rx.recv().await.unwrap().events, report.events);
    assert_eq!(h.saved_status().await, status_of(&[("AAA", Side::Below)]));
}

#[tokio::test]
async fn closed_notification_channel_still_persists_status() {
    let h = Harness::new(&["AAA"], &[("AAA", Side::Above)]);
    h.quote("AAA", 90.0, 100.0).await;

    let (tx, rx) = mpsc::channel(1);
    drop(rx);
    let engine = CrossoverEngine::new(
        h.provider.clone(),
        h.watchlist.clone(),
        h.status.clone(),
        tx,
    )
    .with_metrics(h.metrics.clone());

    let report = assert_ok!(engine.run_tick().await);
    assert_eq!(report.events.len(), 1);
    assert_eq!(h.metrics.notification_failures_total.get(), 1);
    assert_eq!(h.saved_status().await, status_of(&[("AAA", Side::Below)]));
}
