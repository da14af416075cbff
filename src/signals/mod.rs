//! Crossover detection and alert formatting.

pub mod crossover;
pub mod format;

pub use crossover::{
    detect_transitions, CrossoverEngine, TickOutcome, TickReport, DEFAULT_FETCH_CONCURRENCY,
};
pub use format::{render_quotes, render_transitions, transition_message};
