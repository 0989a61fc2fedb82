//! OHLCV (Open, High, Low, Close, Volume) data types.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::Timeframe;

/// Compact OHLCV bar optimized for performance.
/// Uses f64 for fast indicator calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[repr(C)]
pub struct Bar {
    /// Unix timestamp in milliseconds (bar open time)
    pub timestamp: i64,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Trading volume
    pub volume: f64,
}

impl Bar {
    /// Create a new bar.
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// A bar opened by a single traded price.
    pub fn from_price(timestamp: i64, price: f64) -> Self {
        Self::new(timestamp, price, price, price, price, 0.0)
    }

    /// Fold a live price into the bar.
    pub fn absorb(&mut self, price: f64) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
    }
}

/// What happened to a series when a live price was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarUpdate {
    /// The live bar was overwritten in place.
    Updated,
    /// A new bar was opened.
    Appended,
    /// The price belonged to an already closed bar.
    Ignored,
}

/// Time-series container for bars, ordered by strictly increasing timestamp.
#[derive(Debug, Clone)]
pub struct BarSeries {
    /// Symbol identifier
    pub symbol: String,
    /// Timeframe of the bars
    pub timeframe: Timeframe,
    bars: VecDeque<Bar>,
    /// Maximum capacity (0 = unlimited)
    capacity: usize,
}

impl BarSeries {
    /// Create a new empty bar series.
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars: VecDeque::new(),
            capacity: 0,
        }
    }

    /// Create a bar series with a maximum capacity.
    /// When capacity is reached, oldest bars are removed.
    pub fn with_capacity(symbol: impl Into<String>, timeframe: Timeframe, capacity: usize) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn trim(&mut self) {
        while self.capacity > 0 && self.bars.len() > self.capacity {
            self.bars.pop_front();
        }
    }

    /// Insert a bar keeping timestamps strictly increasing.
    /// A bar with an existing timestamp replaces the stored one.
    pub fn upsert(&mut self, bar: Bar) {
        match self.bars.back() {
            None => self.bars.push_back(bar),
            Some(last) if bar.timestamp > last.timestamp => self.bars.push_back(bar),
            _ => match self
                .bars
                .binary_search_by_key(&bar.timestamp, |b| b.timestamp)
            {
                Ok(idx) => self.bars[idx] = bar,
                Err(idx) => self.bars.insert(idx, bar),
            },
        }
        self.trim();
    }

    /// Merge a batch of bars (any order, duplicates allowed; later entries win).
    pub fn merge(&mut self, bars: impl IntoIterator<Item = Bar>) {
        for bar in bars {
            self.upsert(bar);
        }
    }

    /// Apply a live price: overwrite the live bar while its bucket is open,
    /// open a new bar once the bucket rolls over.
    pub fn apply_price(&mut self, price: f64, timestamp_ms: i64) -> BarUpdate {
        let bucket = self.timeframe.bucket_start(timestamp_ms);
        match self.bars.back_mut() {
            Some(live) if live.timestamp == bucket => {
                live.absorb(price);
                BarUpdate::Updated
            }
            Some(live) if live.timestamp > bucket => BarUpdate::Ignored,
            _ => {
                self.bars.push_back(Bar::from_price(bucket, price));
                self.trim();
                BarUpdate::Appended
            }
        }
    }

    /// Get the number of bars.
    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Check if the series is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Copy of the last `n` bars, oldest first.
    pub fn tail(&self, n: usize) -> Vec<Bar> {
        let start = self.bars.len().saturating_sub(n);
        self.bars.iter().skip(start).copied().collect()
    }

    /// Copy of every bar, oldest first.
    pub fn to_vec(&self) -> Vec<Bar> {
        self.bars.iter().copied().collect()
    }

    /// Get the last bar.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.back()
    }
}

/// Column views over a bar slice.
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Highs of a bar slice.
pub fn highs(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.high).collect()
}

/// Lows of a bar slice.
pub fn lows(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.low).collect()
}
