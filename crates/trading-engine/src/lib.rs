//! Quote-driven trading loop.
//!
//! One task owns the bar series, open positions and the session ledger.
//! Quotes, timers and shutdown are multiplexed in a single `select!` loop,
//! so an evaluation never overlaps another or a save.

mod engine;

pub use engine::{EngineConfig, EngineCounters, EngineDeps, TradingEngine};
