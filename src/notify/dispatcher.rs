//! Consumes transition batches from the engine and hands them to a notifier.

use super::Notifier;
use crate::metrics::Metrics;
use crate::models::TransitionBatch;
use crate::signals::format::transition_message;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub const CHANNEL_CAPACITY: usize = 16;

pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    recipient: String,
    metrics: Option<Arc<Metrics>>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, recipient: impl Into<String>) -> Self {
        Self {
            notifier,
            recipient: recipient.into(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Spawn the delivery task.
    ///
    /// The task runs until every sender is dropped and the queue is drained.
    pub fn spawn(self) -> (mpsc::Sender<TransitionBatch>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let handle = tokio::spawn(self.run(rx));
        (tx, handle)
    }

    pub async fn run(self, mut rx: mpsc::Receiver<TransitionBatch>) {
        info!("NotificationDispatcher: started");

        while let Some(batch) = rx.recv().await {
            self.deliver(&batch).await;
        }

        info!("NotificationDispatcher: channel closed, stopped");
    }

    pub async fn deliver(&self, batch: &TransitionBatch) {
        let text = transition_message(batch);
        match self.notifier.notify(&self.recipient, &text).await {
            Ok(()) => info!(
                transitions = batch.events.len(),
                "NotificationDispatcher: delivered {} transitions",
                batch.events.len()
            ),
            Err(e) => {
                warn!(
                    transitions = batch.events.len(),
                    error = %e,
                    "NotificationDispatcher: delivery failed"
                );
                if let Some(ref metrics) = self.metrics {
                    metrics.notification_failures_total.inc();
                }
            }
        }
    }
}
