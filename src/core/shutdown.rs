//! Process termination signals

use tracing::info;

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

/// Listeners for SIGINT and SIGTERM (Ctrl+C only on other platforms).
///
/// Handlers are registered by [`ShutdownSignal::install`], so a signal that
/// arrives before [`ShutdownSignal::recv`] is polled is not lost.
pub struct ShutdownSignal {
    #[cfg(unix)]
    interrupt: Signal,
    #[cfg(unix)]
    terminate: Signal,
}

impl ShutdownSignal {
    /// Must be called from within a tokio runtime.
    #[cfg(unix)]
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {})
    }

    /// Resolve on the first termination signal, returning its name.
    #[cfg(unix)]
    pub async fn recv(mut self) -> &'static str {
        let name = tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        };
        info!(signal = name, "Received {}", name);
        name
    }

    #[cfg(not(unix))]
    pub async fn recv(self) -> &'static str {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!(signal = "ctrl_c", "Received Ctrl+C");
        "ctrl_c"
    }
}
