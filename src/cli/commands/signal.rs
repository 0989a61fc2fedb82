//! Signal command implementation.

use anyhow::Result;
use trading_config::AppConfig;
use trading_core::types::TradeDecision;

use super::{load_generator, load_history};
use crate::cli::SignalArgs;

pub async fn run(args: SignalArgs, config: AppConfig) -> Result<()> {
    config.validate()?;
    let generator = load_generator(&config, args.weights.as_deref())?;
    let bars = load_history(&config, &args.data).await?;

    let evaluation = generator.analyze(&bars)?;
    let last = bars.last().map(|b| b.close).unwrap_or_default();

    println!("{} {} @ {}", config.market.symbol, config.market.timeframe, last);
    println!("  Probability:         {:.4}", evaluation.prediction.probability);
    println!("  Price delta:         {:.5}", evaluation.prediction.price_delta);
    println!("  Confidence:          {:.4}", evaluation.confidence);
    println!("  Composite:           {:.4}", evaluation.composite.combined);
    if let Some(rejection) = &evaluation.rejection {
        println!("  Rejected:            {:?}", rejection);
    }
    match evaluation.decision {
        TradeDecision::Trade(signal) => {
            println!("  Decision:            {}", signal.direction);
            println!("  Entry:               {}", signal.entry_price);
            println!("  Stop loss:           {}", signal.stop_loss);
            println!("  Take profit:         {}", signal.take_profit);
        }
        TradeDecision::NoTrade => println!("  Decision:            no trade"),
    }
    Ok(())
}
