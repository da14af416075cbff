//! EMA (Exponential Moving Average) indicator

use crate::models::indicators::{Candle, EmaIndicator};

/// Period used for crossover detection.
pub const EMA_PERIOD: u32 = 20;

/// Recursive EMA over `values`, seeded with the first value.
///
/// Uses `alpha = 2 / (period + 1)` with no bias adjustment, so every value
/// contributes from the first bar on.
pub fn ema(values: &[f64], period: u32) -> Option<f64> {
    if period == 0 {
        return None;
    }
    let (first, rest) = values.split_first()?;
    let alpha = 2.0 / (period as f64 + 1.0);

    let value = rest
        .iter()
        .fold(*first, |prev, &x| alpha * x + (1.0 - alpha) * prev);
    Some(value)
}

/// Calculate the EMA of candle closes for a specific period
pub fn calculate_ema(candles: &[Candle], period: u32) -> Option<EmaIndicator> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let value = ema(&closes, period)?;

    Some(EmaIndicator { value, period })
}
