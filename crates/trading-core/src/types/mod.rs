//! Core data types for the trading system.

mod ohlcv;
mod order;
mod position;
mod signal;
mod timeframe;

pub use ohlcv::{closes, highs, lows, Bar, BarSeries, BarUpdate};
pub use order::{DealConfirmation, DealReference, DealStatus, Fill, OrderRequest};
pub use position::{ClosedPosition, ClosedTrade, ExitReason, Position};
pub use signal::{Direction, TradeDecision, TradeSignal};
pub use timeframe::Timeframe;
