//! Paper trading command implementation.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use trading_broker::PaperBroker;
use trading_config::{AppConfig, StoreKind};
use trading_core::traits::{QuoteSource, TradeStore};
use trading_data::{CsvPriceFeed, ReplayQuoteSource};
use trading_engine::{EngineConfig, EngineDeps, TradingEngine};
use trading_ledger::{JsonlStore, MemoryStore};

use super::{load_generator, load_history};
use crate::cli::PaperArgs;

pub async fn run(args: PaperArgs, config: AppConfig) -> Result<()> {
    config.validate()?;
    let generator = load_generator(&config, args.weights.as_deref())?;

    let bars = load_history(&config, &args.data).await?;
    let warmup = args.warmup.unwrap_or_else(|| generator.feature_window());
    if bars.len() <= warmup {
        bail!(
            "{} has {} bars, need more than the {} warmup bars",
            args.data.display(),
            bars.len(),
            warmup
        );
    }
    let replay = bars[warmup..].to_vec();
    let start = DateTime::<Utc>::from_timestamp_millis(bars[warmup - 1].timestamp)
        .context("Warmup bar has an invalid timestamp")?;
    info!(warmup, replay = replay.len(), "Starting paper session");

    let store: Arc<dyn TradeStore> = match config.store.kind {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::Jsonl => Arc::new(
            JsonlStore::open(&config.store.path)
                .with_context(|| format!("Failed to open trade store {}", config.store.path.display()))?,
        ),
    };
    let broker = PaperBroker::new(config.broker.paper_balance).with_slippage(config.broker.paper_slippage_pct);
    let feed = CsvPriceFeed::new(&args.data, &config.market.symbol)?;

    let source = ReplayQuoteSource::new(&config.market.symbol, replay, config.market.timeframe)
        .with_spread(config.broker.paper_spread)
        .with_tick_delay(Duration::from_millis(args.tick_delay_ms));
    let quotes = source.stream_quotes(&config.market.symbol).await?;

    let engine_config = EngineConfig {
        symbol: config.market.symbol.clone(),
        timeframe: config.market.timeframe,
        history_bars: config.market.history_bars,
        quote_throttle_ms: config.market.quote_throttle_ms,
        history_refresh_secs: config.market.history_refresh_secs,
        confirm_attempts: config.broker.confirm_attempts,
        confirm_delay_ms: config.broker.confirm_delay_ms,
    };
    let deps = EngineDeps {
        broker: Arc::new(broker),
        feed: Arc::new(feed),
        store,
    };
    let engine = TradingEngine::start(
        engine_config,
        generator,
        &config.risk,
        config.exit.policy,
        config.session.clone(),
        deps,
        start,
    )
    .await?;

    let report = engine.run(quotes, shutdown_on(tokio::signal::ctrl_c())).await?;

    match args.output.as_str() {
        "json" => println!("{}", report.to_json()?),
        _ => println!("{}", report.summary()),
    }
    Ok(())
}

/// Resolves when `listener` fires. A listener that fails never resolves, so
/// the session runs until its quote stream ends.
async fn shutdown_on<F>(listener: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = listener.await {
        warn!(error = %e, "Could not listen for Ctrl-C, running until the feed ends");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_fires_on_signal() {
        let fired = tokio::time::timeout(Duration::from_millis(200), shutdown_on(async { Ok::<(), io::Error>(()) })).await;
        assert!(fired.is_ok());
    }

    #[tokio::test]
    async fn test_failed_listener_never_shuts_down() {
        let listener = async { Err::<(), _>(io::Error::other("no signal handler")) };
        let fired = tokio::time::timeout(Duration::from_millis(50), shutdown_on(listener)).await;
        assert!(fired.is_err());
    }
}
