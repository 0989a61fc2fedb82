//! Train command implementation.

use anyhow::{bail, Result};
use chrono::Utc;
use tracing::info;
use trading_config::AppConfig;
use trading_model::{train, BranchLayout, BranchNetwork, ModelSnapshot};
use trading_signals::build_training_set;

use super::load_history;
use crate::cli::TrainArgs;

pub async fn run(args: TrainArgs, config: AppConfig) -> Result<()> {
    config.validate()?;
    let mut training = config.model.training.clone();
    if let Some(epochs) = args.epochs {
        training.epochs = epochs;
    }

    let bars = load_history(&config, &args.data).await?;
    let assembler = config.signal.assembler()?;
    let window = config.signal.feature_window(config.market.timeframe, assembler.min_bars());
    let samples = build_training_set(&assembler, &bars, window, config.model.prediction_horizon);
    if samples.is_empty() {
        bail!(
            "{} bars are not enough for a {} bar window and a {} bar horizon",
            bars.len(),
            window,
            config.model.prediction_horizon
        );
    }
    info!(bars = bars.len(), samples = samples.len(), window, "Built training set");

    let mut network = BranchNetwork::new(BranchLayout::for_features(assembler.indicator_count()), training.seed);
    let report = train(&mut network, &samples, &training)?;

    let output = args.output.unwrap_or(config.model.weights_path);
    ModelSnapshot::new(network, Some(Utc::now())).save(&output)?;

    println!("Trained on {} samples for {} epochs", report.samples, report.epochs);
    println!("  Final loss:          {:.6}", report.final_loss);
    println!("  Direction accuracy:  {:.2}%", report.accuracy * 100.0);
    println!("  Weights:             {}", output.display());
    Ok(())
}
