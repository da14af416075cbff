//! Environment-driven configuration

use crate::error::ConfigError;
use crate::logging::LogFormat;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Telegram delivery settings. Present only when a bot token is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub tick_interval: Duration,
    pub fetch_concurrency: usize,
    pub yahoo_base_url: String,
    pub telegram: Option<TelegramConfig>,
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "sandbox".to_string(),
            port: 8080,
            data_dir: PathBuf::from("/data"),
            tick_interval: Duration::from_secs(600),
            fetch_concurrency: 4,
            yahoo_base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            telegram: None,
            api_key: None,
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let tick_secs: u64 = parse_or(&get, "TICK_INTERVAL_SECONDS", 600)?;
        if tick_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "TICK_INTERVAL_SECONDS",
                value: tick_secs.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let fetch_concurrency: usize = parse_or(&get, "FETCH_CONCURRENCY", 4)?;
        if fetch_concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "FETCH_CONCURRENCY",
                value: fetch_concurrency.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let telegram = match get("TELEGRAM_BOT_TOKEN") {
            Some(bot_token) => {
                let chat_id = get("TELEGRAM_CHAT_ID")
                    .ok_or(ConfigError::Missing("TELEGRAM_CHAT_ID", "TELEGRAM_BOT_TOKEN"))?;
                Some(TelegramConfig {
                    bot_token,
                    chat_id,
                    api_url: get("TELEGRAM_API_URL")
                        .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
                })
            }
            None => None,
        };

        Ok(Self {
            environment: get("ENVIRONMENT").unwrap_or(defaults.environment),
            port: parse_or(&get, "PORT", defaults.port)?,
            data_dir: get("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            tick_interval: Duration::from_secs(tick_secs),
            fetch_concurrency,
            yahoo_base_url: get("YAHOO_BASE_URL").unwrap_or(defaults.yahoo_base_url),
            telegram,
            api_key: get("API_KEY"),
        })
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "production" | "prod")
    }

    pub fn log_format(&self) -> LogFormat {
        if self.is_production() {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }

    pub fn watchlist_path(&self) -> PathBuf {
        self.data_dir.join("tickers.json")
    }

    pub fn status_path(&self) -> PathBuf {
        self.data_dir.join("status.json")
    }
}

fn parse_or<T, F>(get: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
