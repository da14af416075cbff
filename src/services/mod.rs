//! External data providers

pub mod market_data;
pub mod yahoo;

pub use market_data::{IndicatorProvider, StaticIndicatorProvider};
pub use yahoo::YahooIndicatorProvider;
