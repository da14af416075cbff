//! Grid tables for notifications and quote snapshots

use crate::models::{Quote, TransitionBatch};
use prettytable::{format, Cell, Row, Table};

/// Prefix marking a ticker whose side just changed.
pub const TRANSITION_MARKER: &str = "!";

fn grid(titles: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_DEFAULT);
    table.set_titles(Row::new(titles.iter().map(|t| Cell::new(t)).collect()));
    table
}

fn price_cell(value: f64) -> Cell {
    Cell::new(&format!("{:.2}", value)).style_spec("r")
}

/// Table of transitions with marked tickers.
pub fn render_transitions(batch: &TransitionBatch) -> String {
    let mut table = grid(&["Ticker", "Current", "20EMA", "Side"]);
    for event in &batch.events {
        table.add_row(Row::new(vec![
            Cell::new(&format!("{}{}", TRANSITION_MARKER, event.ticker)),
            price_cell(event.price),
            price_cell(event.ema20),
            Cell::new(event.side.as_str()),
        ]));
    }
    table.to_string()
}

/// Notification text for one batch, fenced for Markdown delivery.
pub fn transition_message(batch: &TransitionBatch) -> String {
    format!(
        "Status Change:\n```\n{}\n```",
        render_transitions(batch).trim_end()
    )
}

/// Table of the current price and 20-EMA per ticker.
pub fn render_quotes(quotes: &[Quote]) -> String {
    let mut table = grid(&["Ticker", "Current", "20EMA"]);
    for quote in quotes {
        table.add_row(Row::new(vec![
            Cell::new(quote.ticker.as_str()),
            price_cell(quote.price),
            price_cell(quote.ema20),
        ]));
    }
    table.to_string()
}
