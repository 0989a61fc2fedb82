//! Price feed and quote stream capabilities.

use crate::error::DataError;
use crate::types::{Bar, Timeframe};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// A real-time quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Symbol
    pub symbol: String,
    /// Best bid price
    pub bid: f64,
    /// Best ask price
    pub ask: f64,
    /// Timestamp (Unix milliseconds)
    pub timestamp: i64,
}

impl Quote {
    pub fn new(symbol: impl Into<String>, bid: f64, ask: f64, timestamp: i64) -> Self {
        Self {
            symbol: symbol.into(),
            bid,
            ask,
            timestamp,
        }
    }

    /// Get the mid price.
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }

    /// Get the spread.
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }

    /// Quote time as a DateTime.
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// Historical price source.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Fetch up to `max_bars` bars, oldest first, optionally bounded by `from`/`to`.
    /// When more bars match than `max_bars`, the most recent ones are returned.
    async fn get_price_history(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        max_bars: usize,
    ) -> Result<Vec<Bar>, DataError>;

    /// Get the data source name.
    fn name(&self) -> &str;
}

/// Real-time quote stream.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Subscribe to quotes for `symbol`. Quotes arrive in timestamp order
    /// until the sender side is dropped.
    async fn stream_quotes(&self, symbol: &str) -> Result<mpsc::Receiver<Quote>, DataError>;

    /// Get the source name.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_calculations() {
        let quote = Quote::new("BTCUSD", 149.95, 150.05, 1000);

        assert!((quote.mid() - 150.0).abs() < 0.001);
        assert!((quote.spread() - 0.10).abs() < 0.001);
        assert_eq!(quote.datetime().timestamp_millis(), 1000);
    }
}
