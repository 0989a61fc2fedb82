//! Open position set.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};
use trading_core::traits::{TradeRecord, TradeStatus, TradeStore, TradeUpdate};
use trading_core::types::{ClosedPosition, Fill, Position, Timeframe, TradeSignal};
use trading_risk::{ExitPolicy, MarketContext};

/// Positions currently held, closed through an [`ExitPolicy`].
///
/// A position leaves the set exactly once, when the policy closes it; the
/// resulting [`ClosedPosition`] cannot be added back.
pub struct PositionLedger {
    positions: Vec<Position>,
    policy: ExitPolicy,
    store: Arc<dyn TradeStore>,
    session_id: Option<i64>,
}

impl PositionLedger {
    pub fn new(policy: ExitPolicy, store: Arc<dyn TradeStore>, session_id: Option<i64>) -> Self {
        Self {
            positions: Vec::new(),
            policy,
            store,
            session_id,
        }
    }

    pub fn policy(&self) -> ExitPolicy {
        self.policy
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Open a position from a confirmed fill, with the signal's levels.
    ///
    /// The creation record is persisted; a store failure is logged and the
    /// position is still tracked, without a trade id.
    pub fn add_position(&mut self, signal: &TradeSignal, fill: Fill, timeframe: Timeframe) -> &Position {
        let mut position = Position::open(fill, signal.stop_loss, signal.take_profit, timeframe);

        let record = TradeRecord {
            session_id: self.session_id,
            symbol: position.symbol.clone(),
            direction: position.direction,
            entry_price: position.entry_price,
            size: position.size,
            stop_loss: position.stop_loss,
            take_profit: position.take_profit,
            entry_time: position.entry_time,
            deal_id: position.deal_id.clone(),
        };
        match self.store.record_trade(&record) {
            Ok(id) => position.trade_id = Some(id),
            Err(e) => warn!(deal_id = %position.deal_id, error = %e, "Failed to record trade"),
        }

        info!(
            symbol = %position.symbol,
            direction = %position.direction,
            entry = %position.entry_price,
            size = %position.size,
            stop_loss = %position.stop_loss,
            take_profit = %position.take_profit,
            trade_id = ?position.trade_id,
            "Position opened"
        );

        self.positions.push(position);
        &self.positions[self.positions.len() - 1]
    }

    /// Mark every open position at `price` and close those the exit policy
    /// selects. Closed positions are removed, persisted and returned.
    pub fn update_positions(&mut self, price: Decimal, ctx: &MarketContext<'_>) -> Vec<ClosedPosition> {
        let mut closed = Vec::new();
        let mut still_open = Vec::with_capacity(self.positions.len());

        for mut position in std::mem::take(&mut self.positions) {
            position.mark(price);
            match self.policy.evaluate(&position, price, ctx) {
                Some(outcome) => {
                    let exit = position.close(price, ctx.now, outcome);
                    self.persist_exit(&exit);
                    info!(
                        symbol = %exit.position.symbol,
                        direction = %exit.position.direction,
                        outcome = %exit.outcome,
                        exit = %exit.exit_price,
                        pnl = %exit.realized_pnl,
                        "Position closed"
                    );
                    closed.push(exit);
                }
                None => still_open.push(position),
            }
        }

        self.positions = still_open;
        closed
    }

    fn persist_exit(&self, exit: &ClosedPosition) {
        let Some(trade_id) = exit.position.trade_id else {
            debug!(deal_id = %exit.position.deal_id, "Closed position has no trade id, skipping store update");
            return;
        };
        let update = TradeUpdate {
            exit_price: exit.exit_price,
            pnl: exit.realized_pnl,
            status: TradeStatus::Closed,
            exit_time: exit.exit_time,
        };
        if let Err(e) = self.store.update_trade(trade_id, &update) {
            warn!(trade_id, error = %e, "Failed to record trade exit");
        }
    }
}
