//! Fixed-interval scheduler for crossover ticks

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Invokes a tick function every `interval`, start to start.
///
/// Ticks run inline on the scheduler task, so two ticks never overlap; a
/// deadline that passes while a tick is still running is dropped rather
/// than queued. The first tick fires one full interval after `start`.
pub struct TickScheduler {
    interval: Duration,
    shutdown: watch::Sender<bool>,
    handle: Arc<RwLock<Option<JoinHandle<()>>>>,
}

impl TickScheduler {
    pub fn new(interval: Duration) -> Self {
        let (shutdown, _) = watch::channel(false);
        info!(
            interval_secs = interval.as_secs(),
            "TickScheduler: created with interval {}s",
            interval.as_secs()
        );
        Self {
            interval,
            shutdown,
            handle: Arc::new(RwLock::new(None)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start the scheduling loop. Does nothing if already running.
    pub async fn start<F, Fut>(&self, mut tick_fn: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut handle = self.handle.write().await;
        if handle.is_some() {
            warn!("TickScheduler: already running");
            return;
        }

        self.shutdown.send_replace(false);
        let mut shutdown = self.shutdown.subscribe();
        let period = self.interval;

        *handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut last_finished = Instant::now();

            loop {
                let deadline = tokio::select! {
                    biased;
                    _ = shutdown.wait_for(|stop| *stop) => break,
                    deadline = ticker.tick() => deadline,
                };

                // The interval yields one stale deadline after a long tick.
                if deadline < last_finished {
                    debug!("TickScheduler: deadline passed during previous tick, skipping");
                    continue;
                }

                debug!("TickScheduler: tick");
                tick_fn().await;
                last_finished = Instant::now();
            }

            info!("TickScheduler: loop exited");
        }));

        info!("TickScheduler: started");
    }

    /// Request shutdown and wait for the loop to exit.
    ///
    /// A tick already executing is allowed to finish first.
    pub async fn stop(&self) {
        self.shutdown.send_replace(true);
        let handle = self.handle.write().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "TickScheduler: task ended abnormally");
            }
            info!("TickScheduler: stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.handle.read().await.is_some()
    }
}
