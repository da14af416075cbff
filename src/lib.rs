//! emawatch: a personal watchlist monitor that alerts when price crosses its 20-period EMA.
//!
//! The crate is organised the same way the service runs:
//! - `store`: durable watchlist / status persistence behind load/save traits
//! - `services`: indicator providers (Yahoo Finance chart API)
//! - `signals`: the crossover engine and message formatting
//! - `notify`: notification transports and the batch dispatcher
//! - `core`: scheduler, command service, HTTP front end and runtime wiring

pub mod config;
pub mod core;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod notify;
pub mod services;
pub mod signals;
pub mod store;
