//! Core traits for the trading system.

mod broker;
mod data_source;
mod indicator;
mod store;

pub use broker::Broker;
pub use data_source::{PriceFeed, Quote, QuoteSource};
pub use indicator::{HlcIndicator, Indicator, MultiOutputIndicator};
pub use store::{
    SessionRecord, SessionStatus, SessionUpdate, TradeRecord, TradeStatus, TradeStore, TradeUpdate,
};
