//! Wires stores, provider, engine, scheduler and notifier into one process

use crate::config::Config;
use crate::error::TickError;
use crate::metrics::Metrics;
use crate::models::{StatusMap, Watchlist};
use crate::notify::{LogNotifier, NotificationDispatcher, Notifier, TelegramNotifier};
use crate::services::market_data::IndicatorProvider;
use crate::services::yahoo::YahooIndicatorProvider;
use crate::signals::CrossoverEngine;
use crate::store::{JsonFileStore, LockedStore, Store};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::commands::WatchlistService;
use super::http::{create_router, AppState};
use super::scheduler::TickScheduler;

pub type RuntimeResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Collaborators the runtime is assembled from.
pub struct Components {
    pub provider: Arc<dyn IndicatorProvider>,
    pub watchlist: Arc<dyn Store<Watchlist>>,
    pub status: Arc<dyn Store<StatusMap>>,
    pub notifier: Arc<dyn Notifier>,
    pub recipient: String,
}

impl Components {
    /// Production collaborators: JSON files under `DATA_DIR`, Yahoo
    /// Finance, and Telegram when configured (log output otherwise).
    pub fn from_config(config: &Config) -> RuntimeResult<Self> {
        let provider = YahooIndicatorProvider::with_base_url(config.yahoo_base_url.clone())?;

        let (notifier, recipient): (Arc<dyn Notifier>, String) = match &config.telegram {
            Some(telegram) => {
                info!("Notifications: Telegram chat {}", telegram.chat_id);
                (
                    Arc::new(TelegramNotifier::new(telegram)?),
                    telegram.chat_id.clone(),
                )
            }
            None => {
                info!("Notifications: TELEGRAM_BOT_TOKEN not set, logging only");
                (Arc::new(LogNotifier), "log".to_string())
            }
        };

        Ok(Self {
            provider: Arc::new(provider),
            watchlist: Arc::new(JsonFileStore::<Watchlist>::new(config.watchlist_path())),
            status: Arc::new(JsonFileStore::<StatusMap>::new(config.status_path())),
            notifier,
            recipient,
        })
    }
}

pub struct WatchRuntime {
    config: Config,
    metrics: Arc<Metrics>,
    engine: Arc<CrossoverEngine>,
    commands: Arc<WatchlistService>,
    scheduler: TickScheduler,
    dispatcher: JoinHandle<()>,
}

impl WatchRuntime {
    pub fn from_config(config: Config) -> RuntimeResult<Self> {
        let components = Components::from_config(&config)?;
        Self::build(config, components)
    }

    /// Assemble the runtime. Spawns the notification task, so this must be
    /// called from within a tokio runtime.
    pub fn build(config: Config, components: Components) -> RuntimeResult<Self> {
        let metrics = Arc::new(Metrics::new()?);

        let watchlist = Arc::new(LockedStore::new(components.watchlist));
        let status = Arc::new(LockedStore::new(components.status));

        let (batches, dispatcher) =
            NotificationDispatcher::new(components.notifier, components.recipient)
                .with_metrics(metrics.clone())
                .spawn();

        let engine = Arc::new(
            CrossoverEngine::new(
                components.provider.clone(),
                watchlist.clone(),
                status.clone(),
                batches,
            )
            .with_fetch_concurrency(config.fetch_concurrency)
            .with_metrics(metrics.clone()),
        );

        let commands = Arc::new(
            WatchlistService::new(watchlist, status, components.provider)
                .with_fetch_concurrency(config.fetch_concurrency)
                .with_metrics(metrics.clone()),
        );

        let scheduler = TickScheduler::new(config.tick_interval);

        Ok(Self {
            config,
            metrics,
            engine,
            commands,
            scheduler,
            dispatcher,
        })
    }

    pub fn engine(&self) -> Arc<CrossoverEngine> {
        self.engine.clone()
    }

    pub fn commands(&self) -> Arc<WatchlistService> {
        self.commands.clone()
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(
            self.metrics.clone(),
            self.commands.clone(),
            self.engine.clone(),
            self.config.api_key.clone(),
        )
    }

    /// Begin periodic ticks. Failed ticks are logged; the next one retries.
    pub async fn start_scheduler(&self) {
        let engine = self.engine.clone();
        self.scheduler
            .start(move || {
                let engine = engine.clone();
                async move {
                    match engine.run_tick().await {
                        Ok(_) => {}
                        Err(TickError::Busy) => {
                            info!("Scheduled tick skipped, previous tick still running")
                        }
                        Err(e) => error!(error = %e, "Scheduled tick failed"),
                    }
                }
            })
            .await;
    }

    /// Serve HTTP and run the scheduler until `shutdown` resolves, then
    /// shut everything down in order.
    pub async fn run<S>(self, shutdown: S) -> RuntimeResult<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let port = self.config.port;
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
        let app = create_router(self.app_state());

        self.start_scheduler().await;

        info!(port = port, "HTTP server listening on port {}", port);
        info!(
            "Metrics endpoint available at http://0.0.0.0:{}/metrics",
            port
        );
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;
        info!("HTTP server stopped");

        self.shutdown().await;
        served?;
        Ok(())
    }

    /// Stop the scheduler (letting an in-flight tick finish), then wait for
    /// queued notifications to be delivered.
    pub async fn shutdown(self) {
        self.scheduler.stop().await;

        let Self {
            engine,
            commands,
            dispatcher,
            ..
        } = self;
        // The engine owns the last batch sender; dropping it closes the channel.
        drop(engine);
        drop(commands);

        if let Err(e) = dispatcher.await {
            error!(error = %e, "Notification task ended abnormally");
        }
        info!("Runtime stopped");
    }
}
