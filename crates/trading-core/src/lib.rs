//! Core types and traits for the signal trader.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, BarSeries, Timeframe)
//! - Trade decisions, orders and the position lifecycle
//! - Capability traits for indicators, brokers, price feeds and storage

pub mod error;
pub mod traits;
pub mod types;

pub use error::{TradingError, TradingResult};
pub use traits::*;
pub use types::*;
