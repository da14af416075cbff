//! Yahoo Finance chart API indicator provider

use crate::config::DEFAULT_YAHOO_BASE_URL;
use crate::error::ProviderError;
use crate::indicators::trend::{calculate_ema, EMA_PERIOD};
use crate::models::{Candle, Observation, Ticker};
use crate::services::market_data::IndicatorProvider;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
const HISTORY_RANGE: &str = "1y";
const BAR_INTERVAL: &str = "1d";

pub struct YahooIndicatorProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooIndicatorProvider {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(DEFAULT_YAHOO_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Daily bars for the last year. Bars without a close are dropped.
    pub async fn get_candles(&self, ticker: &Ticker) -> Result<Vec<Candle>, ProviderError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let response = self
            .client
            .get(&url)
            .query(&[("range", HISTORY_RANGE), ("interval", BAR_INTERVAL)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Unavailable(format!(
                "{} (HTTP {})",
                ticker,
                status.as_u16()
            )));
        }

        let body: ChartResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("chart for {}: {}", ticker, e)))?;

        if let Some(error) = body.chart.error {
            return Err(ProviderError::Unavailable(format!(
                "{}: {}",
                ticker, error.description
            )));
        }

        let Some(result) = body.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(Vec::new());
        };
        let Some(quote) = result.indicators.quote.into_iter().next() else {
            return Ok(Vec::new());
        };

        let candles = result
            .timestamp
            .unwrap_or_default()
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                let close = quote.close.get(i).copied().flatten()?;
                let timestamp = DateTime::<Utc>::from_timestamp(ts, 0)?;
                Some(Candle::new(close, timestamp))
            })
            .collect();

        Ok(candles)
    }
}

#[async_trait::async_trait]
impl IndicatorProvider for YahooIndicatorProvider {
    async fn fetch(&self, ticker: &Ticker) -> Result<Observation, ProviderError> {
        let candles = self.get_candles(ticker).await?;
        let last = candles
            .last()
            .ok_or_else(|| ProviderError::Unavailable(ticker.to_string()))?;
        let ema = calculate_ema(&candles, EMA_PERIOD)
            .ok_or_else(|| ProviderError::Unavailable(ticker.to_string()))?;

        debug!(
            ticker = %ticker,
            bars = candles.len(),
            price = last.close,
            ema20 = ema.value,
            "Yahoo: fetched {} bars for {}",
            candles.len(),
            ticker
        );

        Ok(Observation::new(last.close, ema.value))
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartData,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

/// Only the close series is decoded; open/high/low/volume are ignored.
#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}
