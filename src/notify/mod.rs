//! Notification transports and the batch dispatcher

pub mod dispatcher;
pub mod telegram;

pub use dispatcher::NotificationDispatcher;
pub use telegram::TelegramNotifier;

use crate::error::NotifyError;
use tracing::info;

/// Delivers pre-formatted text to a recipient. Failures are reported, never retried.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: &str, text: &str) -> Result<(), NotifyError>;
}

/// Writes notifications to the log. Used when no transport is configured.
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, recipient: &str, text: &str) -> Result<(), NotifyError> {
        info!(recipient = %recipient, "Notification:\n{}", text);
        Ok(())
    }
}
