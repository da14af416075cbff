pub mod provider;

pub use provider::YahooIndicatorProvider;
