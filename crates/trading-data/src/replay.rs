//! Replays historical bars as a quote stream.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};
use trading_core::error::DataError;
use trading_core::traits::{Quote, QuoteSource};
use trading_core::types::{Bar, Timeframe};

/// Quote source that walks each bar through open, the two extremes and
/// close.
///
/// Rising bars visit the low first, falling bars the high first. Ticks are
/// spaced evenly inside the bar's bucket.
pub struct ReplayQuoteSource {
    symbol: String,
    bars: Vec<Bar>,
    timeframe: Timeframe,
    spread: f64,
    tick_delay: Duration,
    buffer: usize,
}

impl ReplayQuoteSource {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
            timeframe,
            spread: 0.0,
            tick_delay: Duration::ZERO,
            buffer: 1024,
        }
    }

    /// Ask minus bid on every tick.
    pub fn with_spread(mut self, spread: f64) -> Self {
        self.spread = spread.max(0.0);
        self
    }

    /// Wall-clock pause between ticks.
    pub fn with_tick_delay(mut self, delay: Duration) -> Self {
        self.tick_delay = delay;
        self
    }

    /// Quotes for one bar, bid on the intrabar path.
    pub fn ticks_for(&self, bar: &Bar) -> Vec<Quote> {
        let path = if bar.close >= bar.open {
            [bar.open, bar.low, bar.high, bar.close]
        } else {
            [bar.open, bar.high, bar.low, bar.close]
        };
        let step = self.timeframe.as_millis() / path.len() as i64;
        path.iter()
            .enumerate()
            .map(|(i, &bid)| Quote::new(self.symbol.clone(), bid, bid + self.spread, bar.timestamp + step * i as i64))
            .collect()
    }
}

#[async_trait]
impl QuoteSource for ReplayQuoteSource {
    async fn stream_quotes(&self, symbol: &str) -> Result<mpsc::Receiver<Quote>, DataError> {
        if !symbol.eq_ignore_ascii_case(&self.symbol) {
            return Err(DataError::SymbolNotFound(symbol.to_string()));
        }
        if self.bars.is_empty() {
            return Err(DataError::NoDataAvailable);
        }

        let quotes: Vec<Quote> = self.bars.iter().flat_map(|b| self.ticks_for(b)).collect();
        let delay = self.tick_delay;
        let (tx, rx) = mpsc::channel(self.buffer);
        info!(symbol, bars = self.bars.len(), quotes = quotes.len(), "Starting quote replay");

        tokio::spawn(async move {
            let total = quotes.len();
            for quote in quotes {
                if tx.send(quote).await.is_err() {
                    debug!("Quote receiver dropped, stopping replay");
                    return;
                }
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            debug!(quotes = total, "Quote replay finished");
        });

        Ok(rx)
    }

    fn name(&self) -> &str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_path() {
        let up = Bar::new(60_000, 10.0, 12.0, 9.0, 11.0, 0.0);
        let down = Bar::new(120_000, 11.0, 11.5, 8.0, 8.5, 0.0);
        let source = ReplayQuoteSource::new("EURUSD", vec![up, down], Timeframe::Minute1).with_spread(0.5);

        let ticks = source.ticks_for(&up);
        assert_eq!(ticks.iter().map(|q| q.bid).collect::<Vec<_>>(), vec![10.0, 9.0, 12.0, 11.0]);
        assert_eq!(ticks.iter().map(|q| q.timestamp).collect::<Vec<_>>(), vec![60_000, 75_000, 90_000, 105_000]);
        assert_eq!(ticks[0].ask, 10.5);

        let ticks = source.ticks_for(&down);
        assert_eq!(ticks.iter().map(|q| q.bid).collect::<Vec<_>>(), vec![11.0, 11.5, 8.0, 8.5]);
    }

    #[tokio::test]
    async fn test_stream_in_order_then_closes() {
        let bars: Vec<Bar> = (0..3).map(|i| Bar::new(i * 60_000, 1.0, 2.0, 0.5, 1.5, 0.0)).collect();
        let source = ReplayQuoteSource::new("EURUSD", bars, Timeframe::Minute1);

        let mut rx = source.stream_quotes("EURUSD").await.unwrap();
        let mut last = i64::MIN;
        let mut count = 0;
        while let Some(q) = rx.recv().await {
            assert!(q.timestamp > last);
            last = q.timestamp;
            count += 1;
        }
        assert_eq!(count, 12);
    }

    #[tokio::test]
    async fn test_rejects_unknown_symbol_and_empty_history() {
        let source = ReplayQuoteSource::new("EURUSD", Vec::new(), Timeframe::Minute1);
        assert!(matches!(source.stream_quotes("EURUSD").await, Err(DataError::NoDataAvailable)));
        assert!(matches!(source.stream_quotes("USDJPY").await, Err(DataError::SymbolNotFound(_))));
    }
}
