//! Market data sources: CSV price history and quote replay.

mod csv_source;
mod replay;

pub use csv_source::{load_bars, resample, CsvPriceFeed};
pub use replay::ReplayQuoteSource;
