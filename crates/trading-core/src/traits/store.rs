//! Persistence capability for trades and sessions.
//!
//! Implementations own their storage handles per call; nothing is held open
//! between calls.

use crate::error::StoreError;
use crate::types::{Direction, Timeframe};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a persisted trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Closed,
    Cancelled,
}

/// Lifecycle status of a persisted session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Cancelled,
}

/// Creation record for a trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub session_id: Option<i64>,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: Decimal,
    pub size: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub entry_time: DateTime<Utc>,
    pub deal_id: String,
}

/// Exit record for a trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeUpdate {
    pub exit_price: Decimal,
    pub pnl: Decimal,
    pub status: TradeStatus,
    pub exit_time: DateTime<Utc>,
}

/// Creation record for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub initial_balance: Decimal,
    pub started_at: DateTime<Utc>,
}

/// Running totals for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUpdate {
    pub status: SessionStatus,
    pub final_balance: Decimal,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub total_pnl: Decimal,
    pub max_drawdown: Decimal,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Trade and session persistence.
pub trait TradeStore: Send + Sync {
    /// Persist a newly opened trade, returning its id.
    fn record_trade(&self, trade: &TradeRecord) -> Result<i64, StoreError>;

    /// Persist the exit of a trade.
    fn update_trade(&self, trade_id: i64, update: &TradeUpdate) -> Result<(), StoreError>;

    /// Persist a new session, returning its id.
    fn record_session(&self, session: &SessionRecord) -> Result<i64, StoreError>;

    /// Persist the running state of a session.
    fn update_session(&self, session_id: i64, update: &SessionUpdate) -> Result<(), StoreError>;

    /// Get the store name.
    fn name(&self) -> &str;
}
