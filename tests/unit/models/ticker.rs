//! Unit tests for ticker normalisation

use emawatch::models::{Ticker, TickerError};

#[test]
fn test_ticker_is_trimmed_and_uppercased() {
    let ticker = Ticker::parse("  aapl \n").unwrap();
    assert_eq!(ticker.as_str(), "AAPL");
    assert_eq!(ticker, Ticker::parse("AAPL").unwrap());
}

#[test]
fn test_ticker_accepts_exchange_punctuation() {
    for raw in ["^GSPC", "BRK-B", "EURUSD=X", "M&M.NS", "7203.T"] {
        assert!(Ticker::parse(raw).is_ok(), "{raw} should parse");
    }
}

#[test]
fn test_empty_ticker_is_rejected() {
    assert_eq!(Ticker::parse("   "), Err(TickerError::Empty));
    assert_eq!(Ticker::parse(""), Err(TickerError::Empty));
}

#[test]
fn test_long_ticker_is_rejected() {
    let raw = "A".repeat(21);
    assert!(matches!(Ticker::parse(&raw), Err(TickerError::TooLong(_))));
    assert!(Ticker::parse(&"A".repeat(20)).is_ok());
}

#[test]
fn test_inner_whitespace_is_rejected() {
    assert_eq!(
        Ticker::parse("BRK B"),
        Err(TickerError::InvalidCharacter("BRK B".to_string(), ' '))
    );
}

#[test]
fn test_symbols_outside_grammar_are_rejected() {
    assert!(matches!(
        Ticker::parse("AAPL$"),
        Err(TickerError::InvalidCharacter(_, '$'))
    ));
}

#[test]
fn test_ticker_deserialization_normalises() {
    let ticker: Ticker = serde_json::from_str("\" msft \"").unwrap();
    assert_eq!(ticker.as_str(), "MSFT");
    assert_eq!(serde_json::to_string(&ticker).unwrap(), "\"MSFT\"");
    assert!(serde_json::from_str::<Ticker>("\"\"").is_err());
}
