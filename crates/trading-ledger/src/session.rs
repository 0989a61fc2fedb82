//! Session ledger: realized P&L, cooldown and the persisted report.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use trading_core::error::StoreError;
use trading_core::traits::{SessionRecord, SessionStatus, SessionUpdate, TradeStore};
use trading_core::types::{ClosedPosition, ClosedTrade, Timeframe};

use crate::report::SessionReport;
use crate::statistics::{compute_drawdown, SessionStats};

/// Session bookkeeping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory the per-session CSV is written to
    pub report_dir: PathBuf,
    /// Minimum time between opening two positions
    pub cooldown_secs: u64,
    /// Interval of the periodic report save
    pub autosave_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            report_dir: PathBuf::from("reports"),
            cooldown_secs: 900,
            autosave_interval_secs: 300,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.autosave_interval_secs == 0 {
            return Err("autosave_interval_secs must be positive".into());
        }
        if self.cooldown().is_none() {
            return Err(format!("cooldown_secs {} is out of range", self.cooldown_secs));
        }
        Ok(())
    }

    /// Cooldown as a duration, `None` when it does not fit one.
    pub fn cooldown(&self) -> Option<Duration> {
        i64::try_from(self.cooldown_secs).ok().and_then(Duration::try_seconds)
    }
}

/// Books closed trades for one session and persists its state.
pub struct SessionLedger {
    config: SessionConfig,
    store: Arc<dyn TradeStore>,
    session_id: Option<i64>,
    symbol: String,
    timeframe: Timeframe,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    stats: SessionStats,
    trades: Vec<ClosedTrade>,
    last_trade_at: Option<DateTime<Utc>>,
    /// `None` blocks new positions after the first
    cooldown: Option<Duration>,
}

impl SessionLedger {
    /// Start a session and register it with the store.
    ///
    /// A failed registration is logged; the session then runs without an id
    /// and its store updates are skipped.
    pub fn start(
        config: SessionConfig,
        symbol: impl Into<String>,
        timeframe: Timeframe,
        initial_balance: Decimal,
        store: Arc<dyn TradeStore>,
        now: DateTime<Utc>,
    ) -> Self {
        let symbol = symbol.into();
        let record = SessionRecord {
            symbol: symbol.clone(),
            timeframe,
            initial_balance,
            started_at: now,
        };
        let session_id = match store.record_session(&record) {
            Ok(id) => {
                info!(session_id = id, symbol = %symbol, balance = %initial_balance, "Session started");
                Some(id)
            }
            Err(e) => {
                warn!(error = %e, store = store.name(), "Failed to record session");
                None
            }
        };

        let cooldown = config.cooldown();
        if cooldown.is_none() {
            warn!(cooldown_secs = config.cooldown_secs, "Cooldown out of range, one position per session");
        }

        Self {
            config,
            store,
            session_id,
            symbol,
            timeframe,
            started_at: now,
            ended_at: None,
            stats: SessionStats::new(initial_balance),
            trades: Vec::new(),
            last_trade_at: None,
            cooldown,
        }
    }

    pub fn session_id(&self) -> Option<i64> {
        self.session_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn balance(&self) -> Decimal {
        self.stats.balance
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn trades(&self) -> &[ClosedTrade] {
        &self.trades
    }

    /// Book a closed position against the session balance.
    pub fn record_trade(&mut self, closed: ClosedPosition) -> &ClosedTrade {
        let balance_after = self.stats.record(&closed);
        info!(
            symbol = %closed.position.symbol,
            direction = %closed.position.direction,
            outcome = %closed.outcome,
            pnl = %closed.realized_pnl,
            balance = %balance_after,
            "Trade booked"
        );
        self.trades.push(ClosedTrade {
            closed,
            balance_after,
        });
        &self.trades[self.trades.len() - 1]
    }

    /// Maximum drawdown of the session equity curve, in percent.
    pub fn compute_drawdown(&self) -> Decimal {
        compute_drawdown(&self.stats.equity_curve)
    }

    /// Whether the cooldown since the last opened position has elapsed.
    pub fn can_open_new_position(&self, now: DateTime<Utc>) -> bool {
        match self.last_trade_at {
            None => true,
            Some(last) => self.cooldown.is_some_and(|cooldown| now - last >= cooldown),
        }
    }

    pub fn mark_trade_opened(&mut self, now: DateTime<Utc>) {
        self.last_trade_at = Some(now);
    }

    pub fn is_finished(&self) -> bool {
        self.ended_at.is_some()
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            session_id: self.session_id,
            symbol: self.symbol.clone(),
            timeframe: self.timeframe,
            started_at: self.started_at,
            ended_at: self.ended_at,
            stats: self.stats.clone(),
            trades: self.trades.clone(),
        }
    }

    /// Path of this session's CSV report.
    pub fn report_path(&self) -> PathBuf {
        let name = match self.session_id {
            Some(id) => format!("session_{}.csv", id),
            None => format!("session_{}.csv", self.started_at.format("%Y%m%d_%H%M%S")),
        };
        self.config.report_dir.join(name)
    }

    /// Write the trade log and push running totals to the store.
    ///
    /// The CSV is overwritten on every call, so saving an unchanged session
    /// produces the same bytes. A failed store update is logged only.
    pub fn save_report(&self) -> Result<PathBuf, StoreError> {
        let csv = self.report().trades_to_csv()?;
        fs::create_dir_all(&self.config.report_dir)?;
        let path = self.report_path();
        fs::write(&path, csv)?;
        debug!(path = %path.display(), trades = self.trades.len(), "Session report saved");

        if let Some(id) = self.session_id {
            if let Err(e) = self.store.update_session(id, &self.session_update()) {
                warn!(session_id = id, error = %e, "Failed to update session record");
            }
        }
        Ok(path)
    }

    /// Close the session and write the final report.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<PathBuf, StoreError> {
        if self.ended_at.is_none() {
            self.ended_at = Some(now);
        }
        let path = self.save_report()?;
        info!(
            session_id = ?self.session_id,
            trades = self.stats.total_trades,
            balance = %self.stats.balance,
            drawdown_pct = %self.stats.max_drawdown_pct.round_dp(2),
            path = %path.display(),
            "Session finished"
        );
        Ok(path)
    }

    fn session_update(&self) -> SessionUpdate {
        SessionUpdate {
            status: if self.is_finished() {
                SessionStatus::Completed
            } else {
                SessionStatus::Active
            },
            final_balance: self.stats.balance,
            total_trades: self.stats.total_trades,
            winning_trades: self.stats.winning_trades,
            losing_trades: self.stats.losing_trades,
            total_pnl: self.stats.total_pnl(),
            max_drawdown: self.stats.max_drawdown_pct,
            ended_at: self.ended_at,
        }
    }
}
