//! Trading engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use trading_core::error::{BrokerError, TradingError};
use trading_core::traits::{Broker, PriceFeed, Quote, TradeStore};
use trading_core::types::{
    closes, BarSeries, BarUpdate, DealConfirmation, DealReference, DealStatus, Fill, OrderRequest, Timeframe,
    TradeDecision, TradeSignal,
};
use trading_ledger::{PositionLedger, SessionConfig, SessionLedger, SessionReport};
use trading_risk::{price_to_decimal, ExitPolicy, ExitPolicyKind, MarketContext, PositionSizer, RiskConfig};
use trading_signals::SignalGenerator;

/// Closes handed to the exit policy; covers the EMA(13) trend and 10-return
/// volatility windows.
const EXIT_CONTEXT_BARS: usize = 32;

/// Engine settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Bars requested on start and on every history refresh
    pub history_bars: usize,
    /// Quotes closer than this to the last processed one are skipped
    pub quote_throttle_ms: i64,
    pub history_refresh_secs: u64,
    pub confirm_attempts: u32,
    pub confirm_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbol: "EURUSD".to_string(),
            timeframe: Timeframe::Minute1,
            history_bars: 1000,
            quote_throttle_ms: 5000,
            history_refresh_secs: 300,
            confirm_attempts: 2,
            confirm_delay_ms: 1000,
        }
    }
}

/// External capabilities the engine drives.
#[derive(Clone)]
pub struct EngineDeps {
    pub broker: Arc<dyn Broker>,
    pub feed: Arc<dyn PriceFeed>,
    pub store: Arc<dyn TradeStore>,
}

/// Activity counters, logged at shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineCounters {
    pub quotes_received: u64,
    pub quotes_processed: u64,
    pub evaluations: u64,
    pub orders_submitted: u64,
    pub orders_rejected: u64,
    pub positions_opened: u64,
    pub positions_closed: u64,
}

/// Single-writer trading loop.
pub struct TradingEngine {
    config: EngineConfig,
    generator: SignalGenerator,
    sizer: PositionSizer,
    deps: EngineDeps,
    series: BarSeries,
    positions: PositionLedger,
    session: SessionLedger,
    autosave_every: Duration,
    /// Latest market time seen
    clock: DateTime<Utc>,
    last_quote_ms: Option<i64>,
    counters: EngineCounters,
}

impl TradingEngine {
    /// Load history, read the account balance and open a session.
    ///
    /// `now` bounds the initial history request and starts the engine clock.
    /// Failures here are setup errors and end the run.
    pub async fn start(
        config: EngineConfig,
        generator: SignalGenerator,
        risk: &RiskConfig,
        exit: ExitPolicyKind,
        session_config: SessionConfig,
        deps: EngineDeps,
        now: DateTime<Utc>,
    ) -> Result<Self, TradingError> {
        if generator.timeframe() != config.timeframe {
            return Err(TradingError::Config(format!(
                "signal generator timeframe {} differs from market timeframe {}",
                generator.timeframe(),
                config.timeframe
            )));
        }

        let history = deps
            .feed
            .get_price_history(&config.symbol, config.timeframe, None, Some(now), config.history_bars)
            .await?;
        let capacity = config.history_bars.max(generator.feature_window());
        let mut series = BarSeries::with_capacity(config.symbol.clone(), config.timeframe, capacity);
        series.merge(history);

        let balance = deps.broker.account_balance().await?;
        let autosave_every = Duration::from_secs(session_config.autosave_interval_secs.max(1));
        let session = SessionLedger::start(
            session_config,
            config.symbol.clone(),
            config.timeframe,
            balance,
            deps.store.clone(),
            now,
        );
        let positions = PositionLedger::new(ExitPolicy::new(exit), deps.store.clone(), session.session_id());

        info!(
            symbol = %config.symbol,
            timeframe = %config.timeframe,
            bars = series.len(),
            balance = %balance,
            broker = deps.broker.name(),
            feed = deps.feed.name(),
            store = deps.store.name(),
            exit_policy = ?exit,
            "Engine started"
        );

        Ok(Self {
            sizer: PositionSizer::new(risk),
            config,
            generator,
            deps,
            series,
            positions,
            session,
            autosave_every,
            clock: now,
            last_quote_ms: None,
            counters: EngineCounters::default(),
        })
    }

    pub fn counters(&self) -> EngineCounters {
        self.counters
    }

    pub fn series(&self) -> &BarSeries {
        &self.series
    }

    pub fn positions(&self) -> &PositionLedger {
        &self.positions
    }

    pub fn session(&self) -> &SessionLedger {
        &self.session
    }

    /// Run until the quote stream ends or `shutdown` resolves, then write the
    /// final report.
    pub async fn run<F>(mut self, mut quotes: mpsc::Receiver<Quote>, shutdown: F) -> Result<SessionReport, TradingError>
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);

        let mut autosave = interval(self.autosave_every);
        autosave.set_missed_tick_behavior(MissedTickBehavior::Skip);
        autosave.tick().await;
        let mut refresh = interval(Duration::from_secs(self.config.history_refresh_secs.max(1)));
        refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
        refresh.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = autosave.tick() => self.save("autosave"),
                _ = refresh.tick() => self.refresh_history().await,
                quote = quotes.recv() => match quote {
                    Some(quote) => self.on_quote(quote).await,
                    None => {
                        info!("Quote stream ended");
                        break;
                    }
                },
            }
        }

        self.finish()
    }

    /// Process one quote to completion: update the live bar, manage open
    /// positions, then evaluate a new entry.
    pub async fn on_quote(&mut self, quote: Quote) {
        self.counters.quotes_received += 1;
        if !quote.symbol.eq_ignore_ascii_case(&self.config.symbol) {
            debug!(symbol = %quote.symbol, "Ignoring quote for another symbol");
            return;
        }
        if let Some(last) = self.last_quote_ms {
            if quote.timestamp - last < self.config.quote_throttle_ms {
                return;
            }
        }

        let Some(price) = price_to_decimal(quote.bid).filter(|p| *p > Decimal::ZERO) else {
            warn!(bid = quote.bid, "Ignoring quote with invalid bid");
            return;
        };
        if self.series.apply_price(quote.bid, quote.timestamp) == BarUpdate::Ignored {
            debug!(timestamp = quote.timestamp, "Quote older than the live bar");
            return;
        }

        self.last_quote_ms = Some(quote.timestamp);
        self.clock = self.clock.max(quote.datetime());
        self.counters.quotes_processed += 1;

        if let Err(e) = self.deps.broker.on_quote(&quote).await {
            warn!(error = %e, "Broker rejected quote update");
        }

        self.manage_positions(price);

        if self.session.can_open_new_position(self.clock) {
            self.counters.evaluations += 1;
            let bars = self.series.to_vec();
            if let TradeDecision::Trade(signal) = self.generator.evaluate(&bars) {
                self.enter(signal).await;
            }
        }
    }

    fn manage_positions(&mut self, price: Decimal) {
        if self.positions.is_empty() {
            return;
        }
        let recent = closes(&self.series.tail(EXIT_CONTEXT_BARS));
        let ctx = MarketContext::new(self.clock, &recent);
        let closed = self.positions.update_positions(price, &ctx);
        if closed.is_empty() {
            return;
        }

        for position in closed {
            self.counters.positions_closed += 1;
            self.session.record_trade(position);
        }
        self.save("position closed");
    }

    async fn enter(&mut self, signal: TradeSignal) {
        let balance = match self.deps.broker.account_balance().await {
            Ok(balance) => balance,
            Err(e) => {
                warn!(error = %e, "Could not read account balance, skipping entry");
                return;
            }
        };
        let size = self.sizer.calculate(balance, signal.entry_price);
        if size <= Decimal::ZERO {
            warn!(balance = %balance, price = %signal.entry_price, "Position size is zero, skipping entry");
            return;
        }

        let request = OrderRequest::market(self.config.symbol.clone(), signal.direction, size)
            .with_stop(signal.stop_loss)
            .with_profit(signal.take_profit);
        self.counters.orders_submitted += 1;
        let reference = match self.deps.broker.submit_order(request).await {
            Ok(reference) => reference,
            Err(e) => {
                self.counters.orders_rejected += 1;
                warn!(error = %e, direction = %signal.direction, "Order submission failed");
                return;
            }
        };

        let confirmation = match self.confirm(&reference).await {
            Ok(confirmation) => confirmation,
            Err(e) => {
                self.counters.orders_rejected += 1;
                warn!(error = %e, "Deal not confirmed, discarding");
                return;
            }
        };
        if confirmation.status != DealStatus::Open {
            self.counters.orders_rejected += 1;
            warn!(
                reference = %reference,
                status = ?confirmation.status,
                reason = confirmation.reason.as_deref().unwrap_or("none"),
                "Deal not opened, discarding"
            );
            return;
        }

        let fill = Fill {
            deal_id: confirmation.deal_id.unwrap_or_else(|| reference.to_string()),
            symbol: self.config.symbol.clone(),
            direction: signal.direction,
            size,
            price: confirmation.level.unwrap_or(signal.entry_price),
            timestamp: self.clock,
        };
        self.positions.add_position(&signal, fill, self.config.timeframe);
        self.session.mark_trade_opened(self.clock);
        self.counters.positions_opened += 1;
        self.save("position opened");
    }

    /// Poll until the deal reaches a terminal status or attempts run out.
    async fn confirm(&self, reference: &DealReference) -> Result<DealConfirmation, BrokerError> {
        let attempts = self.config.confirm_attempts.max(1);
        for attempt in 1..=attempts {
            match self.deps.broker.confirm_deal(reference).await {
                Ok(confirmation) if confirmation.status.is_terminal() => return Ok(confirmation),
                Ok(_) => debug!(reference = %reference, attempt, "Deal pending"),
                Err(e) => debug!(reference = %reference, attempt, error = %e, "Confirmation poll failed"),
            }
            if attempt < attempts && self.config.confirm_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.confirm_delay_ms)).await;
            }
        }
        Err(BrokerError::Unconfirmed {
            reference: reference.to_string(),
            attempts,
        })
    }

    async fn refresh_history(&mut self) {
        match self
            .deps
            .feed
            .get_price_history(
                &self.config.symbol,
                self.config.timeframe,
                None,
                Some(self.clock),
                self.config.history_bars,
            )
            .await
        {
            Ok(bars) => {
                let fetched = bars.len();
                self.series.merge(bars);
                debug!(fetched, total = self.series.len(), "History refreshed");
            }
            Err(e) => warn!(error = %e, "History refresh failed"),
        }
    }

    fn save(&self, reason: &str) {
        if let Err(e) = self.session.save_report() {
            warn!(reason, error = %e, "Failed to save session report");
        }
    }

    fn finish(mut self) -> Result<SessionReport, TradingError> {
        if !self.positions.is_empty() {
            warn!(open = self.positions.len(), "Positions still open at shutdown");
        }
        info!(counters = ?self.counters, "Engine stopping");

        match self.session.finish(self.clock) {
            Ok(path) => info!(path = %path.display(), "Final report written"),
            Err(e) => {
                error!(error = %e, "Failed to write final report");
                return Err(e.into());
            }
        }
        Ok(self.session.report())
    }
}
