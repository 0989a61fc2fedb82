//! Risk management for trading.
//!
//! Provides entry levels, position sizing and exit policies.

mod exit_policy;
mod levels;
mod position_sizer;

pub use exit_policy::{ExitPolicy, ExitPolicyKind, ExitThresholds, MarketContext};
pub use levels::{get_trade_levels, price_to_decimal, TradeLevels};
pub use position_sizer::{PositionSizer, RiskConfig};
