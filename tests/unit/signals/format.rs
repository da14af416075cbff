//! Unit tests for notification and quote tables

use emawatch::models::{Quote, Side, Ticker, TransitionBatch, TransitionEvent};
use emawatch::signals::{render_quotes, render_transitions, transition_message};

fn event(symbol: &str, price: f64, ema20: f64, side: Side) -> TransitionEvent {
    TransitionEvent {
        ticker: Ticker::parse(symbol).unwrap(),
        price,
        ema20,
        side,
    }
}

#[test]
fn test_transition_table_has_header_and_marked_rows() {
    let batch = TransitionBatch::new(vec![
        event("AAA", 100.0, 105.0, Side::Below),
        event("BBB", 50.123, 40.0, Side::Above),
    ]);
    let table = render_transitions(&batch);

    assert!(table.contains("Ticker"));
    assert!(table.contains("Current"));
    assert!(table.contains("20EMA"));
    assert!(table.contains("Side"));
    assert!(table.contains("!AAA"));
    assert!(table.contains("!BBB"));
    assert!(table.contains("100.00"));
    assert!(table.contains("105.00"));
    assert!(table.contains("50.12"));
    assert!(table.contains("below"));
    assert!(table.contains("above"));

    let aaa = table.lines().position(|l| l.contains("!AAA")).unwrap();
    let bbb = table.lines().position(|l| l.contains("!BBB")).unwrap();
    assert!(aaa < bbb);
}

#[test]
fn test_transition_message_is_fenced() {
    let batch = TransitionBatch::new(vec![event("AAA", 1.0, 2.0, Side::Below)]);
    let message = transition_message(&batch);

    assert!(message.starts_with("Status Change:\n```\n"));
    assert!(message.ends_with("\n```"));
    assert_eq!(message.matches("```").count(), 2);
}

#[test]
fn test_quote_table_lists_every_quote() {
    let quotes = vec![
        Quote {
            ticker: Ticker::parse("MSFT").unwrap(),
            price: 410.5,
            ema20: 402.25,
        },
        Quote {
            ticker: Ticker::parse("AAPL").unwrap(),
            price: 180.0,
            ema20: 185.0,
        },
    ];
    let table = render_quotes(&quotes);

    assert!(table.contains("MSFT"));
    assert!(table.contains("410.50"));
    assert!(table.contains("402.25"));
    assert!(table.contains("AAPL"));
    assert!(!table.contains("!MSFT"));
    assert!(!table.contains("Side"));
}
