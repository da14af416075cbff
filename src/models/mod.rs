//! Shared data models spanning the engine layers.

pub mod crossover;
pub mod indicators;
pub mod ticker;
pub mod watchlist;

pub use crossover::{Observation, Quote, Side, StatusMap, TransitionBatch, TransitionEvent};
pub use indicators::{Candle, EmaIndicator};
pub use ticker::{Ticker, TickerError};
pub use watchlist::Watchlist;
