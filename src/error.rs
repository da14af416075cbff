//! Error types shared across the crate

use std::path::PathBuf;
use thiserror::Error;

/// Failure to read or write one of the persisted structures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt state in {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Why an indicator provider could not produce an observation.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no data available for {0}")]
    Unavailable(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Parse(String),
}

/// Delivery failure reported by a notifier.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Invalid or inconsistent configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set when {1} is set")]
    Missing(&'static str, &'static str),
}

/// Why a crossover tick did not complete.
#[derive(Debug, Error)]
pub enum TickError {
    #[error("a tick is already in flight")]
    Busy,

    #[error(transparent)]
    Store(#[from] StoreError),
}
