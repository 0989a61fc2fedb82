//! CSV price feed.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use trading_core::error::DataError;
use trading_core::traits::PriceFeed;
use trading_core::types::{Bar, Timeframe};

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "date", alias = "timestamp", alias = "Timestamp", alias = "time")]
    date: String,
    #[serde(alias = "Open", alias = "open")]
    open: f64,
    #[serde(alias = "High", alias = "high")]
    high: f64,
    #[serde(alias = "Low", alias = "low")]
    low: f64,
    #[serde(alias = "Close", alias = "close", alias = "Adj Close")]
    close: f64,
    #[serde(alias = "Volume", alias = "volume", default)]
    volume: f64,
}

/// Load every bar of a CSV file, sorted by timestamp.
pub fn load_bars(path: impl AsRef<Path>) -> Result<Vec<Bar>, DataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path.as_ref())
        .map_err(|e| DataError::ParseError(e.to_string()))?;

    let mut bars = Vec::new();
    for result in reader.deserialize() {
        let record: CsvRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;
        let timestamp = parse_timestamp(&record.date)?;
        bars.push(Bar::new(
            timestamp,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        ));
    }

    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by_key(|b| b.timestamp);
    Ok(bars)
}

/// Aggregate bars into `timeframe` buckets.
///
/// Bars already at the target resolution pass through unchanged. Input must be
/// sorted by timestamp.
pub fn resample(bars: &[Bar], timeframe: Timeframe) -> Vec<Bar> {
    let mut out: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        let bucket = timeframe.bucket_start(bar.timestamp);
        match out.last_mut() {
            Some(agg) if agg.timestamp == bucket => {
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume += bar.volume;
            }
            _ => out.push(Bar::new(bucket, bar.open, bar.high, bar.low, bar.close, bar.volume)),
        }
    }
    out
}

/// Parse various timestamp formats.
fn parse_timestamp(date_str: &str) -> Result<i64, DataError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Ok(dt.timestamp_millis());
    }

    let datetime_formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M"];
    for format in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }

    let date_formats = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];
    for format in date_formats {
        if let Ok(d) = NaiveDate::parse_from_str(date_str, format) {
            if let Some(dt) = d.and_hms_opt(0, 0, 0) {
                return Ok(dt.and_utc().timestamp_millis());
            }
        }
    }

    // Unix timestamp; more than 10 digits means milliseconds
    if let Ok(ts) = date_str.parse::<i64>() {
        return Ok(if ts > 10_000_000_000 { ts } else { ts * 1000 });
    }

    Err(DataError::ParseError(format!(
        "Could not parse date: {}",
        date_str
    )))
}

/// Price history read from a CSV file holding one symbol.
///
/// The file is read on every request, so history refreshes pick up rows
/// appended since the last call.
pub struct CsvPriceFeed {
    path: PathBuf,
    symbol: String,
}

impl CsvPriceFeed {
    pub fn new(path: impl Into<PathBuf>, symbol: impl Into<String>) -> Result<Self, DataError> {
        let path = path.into();
        if !path.exists() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(Self {
            path,
            symbol: symbol.into(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PriceFeed for CsvPriceFeed {
    async fn get_price_history(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        max_bars: usize,
    ) -> Result<Vec<Bar>, DataError> {
        if !symbol.eq_ignore_ascii_case(&self.symbol) {
            return Err(DataError::SymbolNotFound(symbol.to_string()));
        }

        let from_ms = from.map(|t| t.timestamp_millis());
        let to_ms = to.map(|t| t.timestamp_millis());
        let mut bars: Vec<Bar> = resample(&load_bars(&self.path)?, timeframe)
            .into_iter()
            .filter(|b| from_ms.map_or(true, |f| b.timestamp >= f))
            .filter(|b| to_ms.map_or(true, |t| b.timestamp <= t))
            .collect();

        if bars.is_empty() {
            return Err(DataError::NoDataAvailable);
        }
        if max_bars > 0 && bars.len() > max_bars {
            bars.drain(..bars.len() - max_bars);
        }

        debug!(symbol, timeframe = %timeframe, bars = bars.len(), path = %self.path.display(), "Loaded price history");
        Ok(bars)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(rows: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,open,high,low,close,volume").unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        file
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2024-01-15").is_ok());
        assert!(parse_timestamp("2024-01-15 10:30:00").is_ok());
        assert_eq!(parse_timestamp("2024-01-15T10:30:00Z").unwrap(), 1_705_314_600_000);
        assert_eq!(parse_timestamp("1705312800000").unwrap(), 1_705_312_800_000); // Unix ms
        assert_eq!(parse_timestamp("1705312800").unwrap(), 1_705_312_800_000); // Unix sec
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_resample_minutes_to_five() {
        let bars: Vec<Bar> = (0..7)
            .map(|i| {
                let c = 100.0 + i as f64;
                Bar::new(i * 60_000, c - 0.5, c + 1.0, c - 1.0, c, 10.0)
            })
            .collect();

        let out = resample(&bars, Timeframe::Minute5);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].timestamp, 0);
        assert_eq!(out[0].open, 99.5);
        assert_eq!(out[0].high, 105.0);
        assert_eq!(out[0].low, 99.0);
        assert_eq!(out[0].close, 104.0);
        assert_eq!(out[0].volume, 50.0);
        assert_eq!(out[1].timestamp, 300_000);

        assert_eq!(resample(&bars, Timeframe::Minute1), bars);
    }

    #[tokio::test]
    async fn test_price_history_window() {
        let file = write_csv(&[
            "1705312980000,1,1,1,4,0",
            "1705312800000,1,1,1,1,0",
            "1705312860000,1,1,1,2,0",
            "1705312920000,1,1,1,3,0",
        ]);
        let feed = CsvPriceFeed::new(file.path(), "EURUSD").unwrap();

        let all = feed
            .get_price_history("EURUSD", Timeframe::Minute1, None, None, 0)
            .await
            .unwrap();
        assert_eq!(all.iter().map(|b| b.close).collect::<Vec<_>>(), vec![1.0, 2.0, 3.0, 4.0]);

        let last_two = feed
            .get_price_history("eurusd", Timeframe::Minute1, None, None, 2)
            .await
            .unwrap();
        assert_eq!(last_two.iter().map(|b| b.close).collect::<Vec<_>>(), vec![3.0, 4.0]);

        let from = DateTime::from_timestamp_millis(1_705_312_860_000);
        let to = DateTime::from_timestamp_millis(1_705_312_920_000);
        let ranged = feed
            .get_price_history("EURUSD", Timeframe::Minute1, from, to, 10)
            .await
            .unwrap();
        assert_eq!(ranged.len(), 2);

        assert!(matches!(
            feed.get_price_history("GBPUSD", Timeframe::Minute1, None, None, 10).await,
            Err(DataError::SymbolNotFound(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            CsvPriceFeed::new("/nonexistent/prices.csv", "EURUSD"),
            Err(DataError::NoDataAvailable)
        ));
    }
}
