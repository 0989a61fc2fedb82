//! Session report rendering.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trading_core::error::StoreError;
use trading_core::types::{ClosedTrade, Direction, ExitReason, Timeframe};

use crate::statistics::SessionStats;

/// Snapshot of a session: identity, statistics and every booked trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Option<i64>,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub stats: SessionStats,
    pub trades: Vec<ClosedTrade>,
}

/// One CSV row per closed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRow {
    pub trade_id: Option<i64>,
    pub deal_id: String,
    pub symbol: String,
    pub direction: Direction,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub size: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub outcome: ExitReason,
    pub pnl: Decimal,
    pub balance_after: Decimal,
}

impl From<&ClosedTrade> for TradeRow {
    fn from(trade: &ClosedTrade) -> Self {
        let p = trade.position();
        Self {
            trade_id: p.trade_id,
            deal_id: p.deal_id.clone(),
            symbol: p.symbol.clone(),
            direction: p.direction,
            entry_time: p.entry_time,
            exit_time: trade.closed.exit_time,
            entry_price: p.entry_price,
            exit_price: trade.closed.exit_price,
            size: p.size,
            stop_loss: p.stop_loss,
            take_profit: p.take_profit,
            outcome: trade.outcome(),
            pnl: trade.realized_pnl(),
            balance_after: trade.balance_after,
        }
    }
}

/// Money to cents; `{:.2}` alone truncates a `Decimal`.
fn rounded(value: Decimal) -> Decimal {
    value.round_dp(2)
}

impl SessionReport {
    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let s = &self.stats;
        let mut out = String::new();

        out.push_str("═══════════════════════════════════════════════════════════\n");
        out.push_str("                      SESSION REPORT                        \n");
        out.push_str("═══════════════════════════════════════════════════════════\n\n");

        out.push_str("SESSION\n");
        out.push_str("───────────────────────────────────────────────────────────\n");
        match self.session_id {
            Some(id) => out.push_str(&format!("  Session:             {}\n", id)),
            None => out.push_str("  Session:             (not persisted)\n"),
        }
        out.push_str(&format!("  Symbol:              {}\n", self.symbol));
        out.push_str(&format!("  Timeframe:           {}\n", self.timeframe));
        out.push_str(&format!(
            "  Started:             {}\n",
            self.started_at.format("%Y-%m-%d %H:%M:%S")
        ));
        if let Some(ended) = self.ended_at {
            let minutes = (ended - self.started_at).num_minutes();
            out.push_str(&format!("  Duration:            {}h {:02}m\n", minutes / 60, minutes % 60));
        }
        out.push('\n');

        out.push_str("PERFORMANCE\n");
        out.push_str("───────────────────────────────────────────────────────────\n");
        out.push_str(&format!("  Initial Balance:     {:.2}\n", rounded(s.initial_balance)));
        out.push_str(&format!("  Final Balance:       {:.2}\n", rounded(s.balance)));
        out.push_str(&format!("  Total P&L:           {:.2}\n", rounded(s.total_pnl())));
        out.push_str(&format!("  Return:              {:.2}%\n", rounded(s.return_pct())));
        out.push_str(&format!("  Max Drawdown:        {:.2}%\n", rounded(s.max_drawdown_pct)));
        match s.profit_factor() {
            Some(pf) => out.push_str(&format!("  Profit Factor:       {:.2}\n", rounded(pf))),
            None => out.push_str("  Profit Factor:       n/a\n"),
        }
        out.push('\n');

        out.push_str("TRADE STATISTICS\n");
        out.push_str("───────────────────────────────────────────────────────────\n");
        out.push_str(&format!("  Total Trades:        {}\n", s.total_trades));
        out.push_str(&format!("  Long / Short:        {} / {}\n", s.long_trades, s.short_trades));
        out.push_str(&format!("  Winning Trades:      {}\n", s.winning_trades));
        out.push_str(&format!("  Losing Trades:       {}\n", s.losing_trades));
        out.push_str(&format!("  Win Rate:            {:.2}%\n", rounded(s.win_rate_pct())));
        out.push_str(&format!("  Avg Win:             {:.2}\n", rounded(s.avg_win())));
        out.push_str(&format!("  Avg Loss:            {:.2}\n", rounded(s.avg_loss())));
        out.push_str(&format!("  Largest Win:         {:.2}\n", rounded(s.largest_win)));
        out.push_str(&format!("  Largest Loss:        {:.2}\n", rounded(s.largest_loss)));
        out.push('\n');

        out.push_str("EXITS\n");
        out.push_str("───────────────────────────────────────────────────────────\n");
        out.push_str(&format!("  Take Profit:         {}\n", s.take_profit_exits));
        out.push_str(&format!("  Stop Loss:           {}\n", s.stop_loss_exits));
        out.push_str(&format!("  Early Exit:          {}\n", s.early_exits));
        out.push('\n');

        out.push_str("═══════════════════════════════════════════════════════════\n");

        out
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Trade log as CSV, header included even when empty.
    pub fn trades_to_csv(&self) -> Result<String, StoreError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer
            .write_record(TRADE_COLUMNS)
            .map_err(|e| StoreError::Encoding(e.to_string()))?;
        for trade in &self.trades {
            writer
                .serialize(TradeRow::from(trade))
                .map_err(|e| StoreError::Encoding(e.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| StoreError::Encoding(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| StoreError::Encoding(e.to_string()))
    }
}

const TRADE_COLUMNS: [&str; 14] = [
    "trade_id",
    "deal_id",
    "symbol",
    "direction",
    "entry_time",
    "exit_time",
    "entry_price",
    "exit_price",
    "size",
    "stop_loss",
    "take_profit",
    "outcome",
    "pnl",
    "balance_after",
];

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use trading_core::types::{Fill, Position};

    fn report() -> SessionReport {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let fill = Fill {
            deal_id: "DEAL-1".into(),
            symbol: "EURUSD".into(),
            direction: Direction::Long,
            size: dec!(0.5),
            price: dec!(100),
            timestamp: start,
        };
        let mut position = Position::open(fill, dec!(97), dec!(103), Timeframe::Minute5);
        position.trade_id = Some(7);
        let closed = position.close(dec!(103.5), start + Duration::minutes(30), ExitReason::TakeProfit);

        let mut stats = SessionStats::new(dec!(1000));
        let balance_after = stats.record(&closed);

        SessionReport {
            session_id: Some(3),
            symbol: "EURUSD".into(),
            timeframe: Timeframe::Minute5,
            started_at: start,
            ended_at: Some(start + Duration::minutes(95)),
            stats,
            trades: vec![ClosedTrade { closed, balance_after }],
        }
    }

    #[test]
    fn test_report_summary() {
        let summary = report().summary();
        assert!(summary.contains("SESSION REPORT"));
        assert!(summary.contains("Final Balance:       1000.02"));
        assert!(summary.contains("Duration:            1h 35m"));
        assert!(summary.contains("Profit Factor:       n/a"));
        assert!(summary.contains("Take Profit:         1"));
    }

    #[test]
    fn test_summary_rounds_money() {
        let summary = report().summary();
        assert!(summary.contains("Total P&L:           0.02\n"));
        assert!(summary.contains("Largest Win:         0.02\n"));
        assert!(!summary.contains("1000.01"));
    }

    #[test]
    fn test_trades_csv() {
        let csv = report().trades_to_csv().unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(TRADE_COLUMNS.join(",").as_str()));

        let row = lines.next().unwrap();
        assert!(row.starts_with("7,DEAL-1,EURUSD,long,2024-03-01T09:00:00Z,2024-03-01T09:30:00Z,100,103.5,0.5,97,103,take_profit,"));
        assert!(row.contains(",0.0175,"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_empty_csv_has_header() {
        let mut r = report();
        r.trades.clear();
        assert_eq!(r.trades_to_csv().unwrap(), format!("{}\n", TRADE_COLUMNS.join(",")));
    }

    #[test]
    fn test_to_json() {
        let json = report().to_json().unwrap();
        assert!(json.contains("\"session_id\": 3"));
    }
}
