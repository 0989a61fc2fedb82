//! CLI command implementations.

pub mod paper;
pub mod signal;
pub mod train;
pub mod validate;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use trading_config::AppConfig;
use trading_core::types::Bar;
use trading_data::CsvPriceFeed;
use trading_model::{ModelSnapshot, PredictiveModel};
use trading_signals::SignalGenerator;

/// Load weights and build the signal generator for the configured timeframe.
pub(crate) fn load_generator(config: &AppConfig, weights: Option<&Path>) -> Result<SignalGenerator> {
    let path = weights.unwrap_or(&config.model.weights_path);
    let snapshot = ModelSnapshot::load(path)
        .with_context(|| format!("Failed to load model weights from {}", path.display()))?;
    let model: Arc<dyn PredictiveModel> = Arc::new(snapshot.into_network());

    SignalGenerator::new(config.signal.clone(), config.market.timeframe, &config.risk, model)
        .context("Model does not fit the configured features")
}

/// All bars of the configured symbol and timeframe in `path`.
pub(crate) async fn load_history(config: &AppConfig, path: &Path) -> Result<Vec<Bar>> {
    use trading_core::traits::PriceFeed;

    let feed = CsvPriceFeed::new(path, &config.market.symbol)
        .with_context(|| format!("Failed to open price history {}", path.display()))?;
    let bars = feed
        .get_price_history(&config.market.symbol, config.market.timeframe, None, None, 0)
        .await
        .with_context(|| format!("No {} bars in {}", config.market.timeframe, path.display()))?;
    Ok(bars)
}
