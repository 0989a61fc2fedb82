//! Trade signal generation.
//!
//! One call to [`SignalGenerator::evaluate`] turns a bar window into a
//! [`TradeDecision`]:
//!
//! 1. slice the trailing window for the timeframe
//! 2. measure volatility, ADX and momentum
//! 3. assemble the feature vector (unavailable → no trade)
//! 4. run the model
//! 5. take the technical base confidence
//! 6. scale it by volatility, trend and momentum factors (adaptive mode)
//! 7. reject below the confidence threshold
//! 8. map probability to a direction through a symmetric dead zone
//! 9. apply the ADX and regime filters
//! 10. attach stop-loss and take-profit levels
//!
//! Errors never escape `evaluate`; they are logged and become `NoTrade`.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use trading_core::error::{ModelError, SignalError};
use trading_core::traits::{HlcIndicator, Indicator};
use trading_core::types::{closes, highs, lows, Bar, Direction, Timeframe, TradeDecision, TradeSignal};
use trading_indicators::{returns_volatility, Adx, FeatureSpec, Roc};
use trading_model::{Prediction, PredictiveModel};
use trading_patterns::FractalRule;
use trading_risk::{get_trade_levels, price_to_decimal, RiskConfig, TradeLevels};

use crate::assembler::FeatureAssembler;
use crate::composite::{CompositeSignal, CompositeWeights};
use crate::filters::{AdxFilter, RegimeFilter, Rejection};
use crate::profile::TimeframeProfile;
use crate::technical::TechnicalConfig;

/// Single-timeframe or timeframe-adaptive evaluation.
///
/// `Fixed` uses a `max_bars_back` window, a fixed ADX period and the raw base
/// confidence. `Adaptive` sizes the window per timeframe and scales
/// confidence by market conditions, so the two modes can disagree on the
/// same bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalMode {
    Fixed,
    #[default]
    Adaptive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub mode: SignalMode,
    pub confidence_threshold: f64,
    /// Probability above which the model calls long
    pub long_probability: f64,
    /// Probability below which the model calls short
    pub short_probability: f64,
    pub use_adx_filter: bool,
    pub adx_threshold: f64,
    /// ADX period in fixed mode
    pub adx_period: usize,
    pub use_regime_filter: bool,
    pub regime_lookback: usize,
    pub regime_threshold: f64,
    pub fractal_rule: FractalRule,
    /// Window length in fixed mode
    pub max_bars_back: usize,
    pub features: Vec<FeatureSpec>,
    pub technical: TechnicalConfig,
    pub composite: CompositeWeights,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            mode: SignalMode::Adaptive,
            confidence_threshold: 0.45,
            long_probability: 0.55,
            short_probability: 0.45,
            use_adx_filter: true,
            adx_threshold: 15.0,
            adx_period: 14,
            use_regime_filter: false,
            regime_lookback: 20,
            regime_threshold: 0.05,
            fractal_rule: FractalRule::Regular,
            max_bars_back: 1000,
            features: FeatureSpec::defaults(),
            technical: TechnicalConfig::default(),
            composite: CompositeWeights::default(),
        }
    }
}

impl SignalConfig {
    pub fn validate(&self) -> Result<(), SignalError> {
        let invalid = |msg: String| Err(SignalError::InvalidConfig(msg));
        let unit = 0.0..=1.0;
        if !unit.contains(&self.confidence_threshold) {
            return invalid(format!("confidence_threshold {} outside [0, 1]", self.confidence_threshold));
        }
        if !unit.contains(&self.long_probability) || !unit.contains(&self.short_probability) {
            return invalid("probability thresholds must lie in [0, 1]".into());
        }
        if self.short_probability > self.long_probability {
            return invalid(format!(
                "short_probability {} exceeds long_probability {}",
                self.short_probability, self.long_probability
            ));
        }
        if self.adx_threshold < 0.0 || self.adx_period == 0 {
            return invalid("ADX threshold and period must be positive".into());
        }
        if self.regime_lookback < 2 || self.regime_threshold < 0.0 {
            return invalid("regime filter needs lookback >= 2 and a non-negative threshold".into());
        }
        if self.max_bars_back == 0 {
            return invalid("max_bars_back must be positive".into());
        }
        self.technical.validate()
    }

    /// Feature window for `timeframe`, never shorter than `min_bars`.
    pub fn feature_window(&self, timeframe: Timeframe, min_bars: usize) -> usize {
        let window = match self.mode {
            SignalMode::Fixed => self.max_bars_back,
            SignalMode::Adaptive => TimeframeProfile::for_timeframe(timeframe).window,
        };
        window.max(min_bars)
    }

    /// Assembler for this configuration.
    pub fn assembler(&self) -> Result<FeatureAssembler, SignalError> {
        FeatureAssembler::new(self.features.clone(), self.fractal_rule, &self.technical)
    }
}

/// Market measurements over the context window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Annualized standard deviation of returns
    pub volatility: Option<f64>,
    pub adx: Option<f64>,
    /// Rate of change over the momentum period
    pub momentum: Option<f64>,
}

/// Everything one evaluation produced, for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub decision: TradeDecision,
    pub prediction: Prediction,
    pub base_confidence: f64,
    pub confidence: f64,
    pub candidate: Option<Direction>,
    pub rejection: Option<Rejection>,
    pub market: MarketSnapshot,
    pub composite: CompositeSignal,
}

pub struct SignalGenerator {
    config: SignalConfig,
    timeframe: Timeframe,
    profile: TimeframeProfile,
    assembler: FeatureAssembler,
    model: Arc<dyn PredictiveModel>,
    stop_loss_pct: Decimal,
    take_profit_pct: Decimal,
}

impl SignalGenerator {
    /// Build a generator. Fails if the configuration is invalid or the model
    /// was trained on a different vector length; both are fatal.
    pub fn new(
        config: SignalConfig,
        timeframe: Timeframe,
        risk: &RiskConfig,
        model: Arc<dyn PredictiveModel>,
    ) -> Result<Self, SignalError> {
        config.validate()?;
        let assembler = config.assembler()?;
        if model.input_len() != assembler.feature_len() {
            return Err(SignalError::Inference(ModelError::ShapeMismatch {
                expected: assembler.feature_len(),
                actual: model.input_len(),
            }));
        }

        Ok(Self {
            profile: TimeframeProfile::for_timeframe(timeframe),
            config,
            timeframe,
            assembler,
            model,
            stop_loss_pct: risk.stop_loss_pct,
            take_profit_pct: risk.take_profit_pct,
        })
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn assembler(&self) -> &FeatureAssembler {
        &self.assembler
    }

    /// Fewest bars that can produce a decision.
    pub fn min_bars(&self) -> usize {
        self.assembler.min_bars()
    }

    /// Bars the feature vector is computed over.
    pub fn feature_window(&self) -> usize {
        self.config.feature_window(self.timeframe, self.assembler.min_bars())
    }

    fn context_window(&self) -> usize {
        match self.config.mode {
            SignalMode::Fixed => self.feature_window(),
            SignalMode::Adaptive => self.profile.window,
        }
    }

    /// Decision for the latest bar. Never fails.
    pub fn evaluate(&self, bars: &[Bar]) -> TradeDecision {
        match self.analyze(bars) {
            Ok(evaluation) => {
                match (&evaluation.decision, &evaluation.rejection) {
                    (TradeDecision::Trade(signal), _) => info!(
                        direction = %signal.direction,
                        confidence = signal.confidence,
                        probability = signal.probability,
                        entry = %signal.entry_price,
                        stop_loss = %signal.stop_loss,
                        take_profit = %signal.take_profit,
                        composite = evaluation.composite.combined,
                        "Trade signal"
                    ),
                    (_, Some(rejection)) => debug!(
                        ?rejection,
                        probability = evaluation.prediction.probability,
                        confidence = evaluation.confidence,
                        composite = evaluation.composite.combined,
                        "No trade"
                    ),
                    _ => {}
                }
                evaluation.decision
            }
            Err(e) => {
                warn!(error = %e, bars = bars.len(), "Signal evaluation skipped");
                TradeDecision::NoTrade
            }
        }
    }

    /// Full evaluation with diagnostics.
    pub fn analyze(&self, bars: &[Bar]) -> Result<Evaluation, SignalError> {
        let required = self.min_bars();
        if bars.len() < required {
            return Err(SignalError::InsufficientData {
                required,
                available: bars.len(),
            });
        }

        let feature_bars = tail(bars, self.feature_window());
        let features = self
            .assembler
            .assemble(feature_bars)
            .ok_or_else(|| SignalError::FeaturesUnavailable("feature vector incomplete".into()))?;
        let market = self.market_snapshot(tail(bars, self.context_window()));

        let prediction = self.model.predict(&features.vector)?;
        if !prediction.probability.is_finite() || !prediction.price_delta.is_finite() {
            return Err(SignalError::Inference(ModelError::NonFinite));
        }

        let base_confidence = features.technical.confidence();
        let confidence = self.adjust_confidence(base_confidence, &market, prediction.probability);
        let composite = CompositeSignal::compute(
            &self.config.composite,
            Some(prediction.probability),
            Some(&features.pattern),
            Some(&features.technical),
        );
        let candidate = self.direction_for(prediction.probability);

        let mut evaluation = Evaluation {
            decision: TradeDecision::NoTrade,
            prediction,
            base_confidence,
            confidence,
            candidate,
            rejection: None,
            market,
            composite,
        };

        if let Err(rejection) = self.gate(bars, &evaluation) {
            evaluation.rejection = Some(rejection);
            return Ok(evaluation);
        }
        let Some(direction) = candidate else {
            return Ok(evaluation);
        };

        let last_close = bars.last().map(|b| b.close).unwrap_or(f64::NAN);
        let entry_price = price_to_decimal(last_close)
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| SignalError::FeaturesUnavailable(format!("invalid price {last_close}")))?;
        let levels = self.levels(entry_price, direction);

        evaluation.decision = TradeDecision::Trade(TradeSignal {
            direction,
            confidence,
            entry_price,
            stop_loss: levels.stop_loss,
            take_profit: levels.take_profit,
            probability: prediction.probability,
            price_delta: prediction.price_delta,
        });
        Ok(evaluation)
    }

    /// Stop-loss and take-profit for an entry at `price`.
    pub fn levels(&self, price: Decimal, direction: Direction) -> TradeLevels {
        get_trade_levels(price, direction, self.stop_loss_pct, self.take_profit_pct)
    }

    /// Symmetric dead zone around 0.5.
    pub fn direction_for(&self, probability: f64) -> Option<Direction> {
        if probability > self.config.long_probability {
            Some(Direction::Long)
        } else if probability < self.config.short_probability {
            Some(Direction::Short)
        } else {
            None
        }
    }

    fn adjust_confidence(&self, base: f64, market: &MarketSnapshot, probability: f64) -> f64 {
        let adjusted = match self.config.mode {
            SignalMode::Fixed => base,
            SignalMode::Adaptive => {
                base * self.profile.volatility_factor(market.volatility)
                    * self.profile.trend_factor(market.adx)
                    * TimeframeProfile::momentum_factor(market.momentum, probability - 0.5)
            }
        };
        adjusted.clamp(0.0, 1.0)
    }

    fn gate(&self, bars: &[Bar], evaluation: &Evaluation) -> Result<(), Rejection> {
        if evaluation.confidence < self.config.confidence_threshold {
            return Err(Rejection::LowConfidence {
                confidence: evaluation.confidence,
                threshold: self.config.confidence_threshold,
            });
        }
        let Some(direction) = evaluation.candidate else {
            return Err(Rejection::NoDirection {
                probability: evaluation.prediction.probability,
            });
        };
        if self.config.use_adx_filter {
            AdxFilter {
                threshold: self.config.adx_threshold,
            }
            .check(evaluation.market.adx)?;
        }
        if self.config.use_regime_filter {
            RegimeFilter {
                lookback: self.config.regime_lookback,
                threshold: self.config.regime_threshold,
            }
            .check(&closes(bars), direction)?;
        }
        Ok(())
    }

    fn market_snapshot(&self, window: &[Bar]) -> MarketSnapshot {
        let (adx_period, momentum_period) = match self.config.mode {
            SignalMode::Fixed => (self.config.adx_period, self.profile.momentum_period),
            SignalMode::Adaptive => (self.profile.adx_period, self.profile.momentum_period),
        };
        let close = closes(window);
        let finite = |v: &f64| v.is_finite();

        MarketSnapshot {
            volatility: returns_volatility(&close, self.profile.annualization).filter(finite),
            adx: Adx::new(adx_period)
                .calculate(&highs(window), &lows(window), &close)
                .last()
                .copied()
                .filter(finite),
            momentum: Roc::new(momentum_period)
                .calculate(&close)
                .last()
                .copied()
                .filter(finite),
        }
    }
}

fn tail(bars: &[Bar], n: usize) -> &[Bar] {
    &bars[bars.len().saturating_sub(n)..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// Returns a fixed probability regardless of input.
    struct FixedModel {
        probability: f64,
        input_len: usize,
    }

    impl PredictiveModel for FixedModel {
        fn input_len(&self) -> usize {
            self.input_len
        }

        fn predict(&self, features: &[f64]) -> Result<Prediction, ModelError> {
            if features.len() != self.input_len {
                return Err(ModelError::ShapeMismatch {
                    expected: self.input_len,
                    actual: features.len(),
                });
            }
            Ok(Prediction {
                probability: self.probability,
                price_delta: 0.0,
            })
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn model(probability: f64) -> Arc<dyn PredictiveModel> {
        Arc::new(FixedModel {
            probability,
            input_len: 11,
        })
    }

    fn uptrend(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let c = 100.0 + i as f64;
                Bar::new(i as i64 * 60_000, c - 0.5, c + 0.5, c - 0.5, c, 1_000.0)
            })
            .collect()
    }

    fn sideways(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let c = if i % 2 == 0 { 100.0 } else { 100.5 };
                Bar::new(i as i64 * 60_000, c, c + 0.3, c - 0.3, c, 1_000.0)
            })
            .collect()
    }

    fn generator(config: SignalConfig, probability: f64) -> SignalGenerator {
        SignalGenerator::new(config, Timeframe::Minute1, &RiskConfig::default(), model(probability)).unwrap()
    }

    fn fixed_config() -> SignalConfig {
        SignalConfig {
            mode: SignalMode::Fixed,
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_model_shape_mismatch() {
        let bad = Arc::new(FixedModel {
            probability: 0.9,
            input_len: 10,
        });
        let result = SignalGenerator::new(SignalConfig::default(), Timeframe::Minute1, &RiskConfig::default(), bad);
        assert!(matches!(
            result,
            Err(SignalError::Inference(ModelError::ShapeMismatch { expected: 11, actual: 10 }))
        ));
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let config = SignalConfig {
            long_probability: 0.4,
            short_probability: 0.6,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(SignalConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_fractal_rule_is_regular() {
        assert_eq!(SignalConfig::default().fractal_rule, FractalRule::Regular);
        assert_eq!(SignalConfig::default().fractal_rule, FractalRule::default());
    }

    #[test]
    fn test_dead_zone() {
        let g = generator(fixed_config(), 0.5);
        assert_eq!(g.direction_for(0.56), Some(Direction::Long));
        assert_eq!(g.direction_for(0.44), Some(Direction::Short));
        assert_eq!(g.direction_for(0.5), None);
        assert_eq!(g.direction_for(0.55), None);
        assert_eq!(g.direction_for(0.45), None);
    }

    #[test]
    fn test_insufficient_bars_is_no_trade() {
        let g = generator(SignalConfig::default(), 0.9);
        let bars = uptrend(10);

        assert_eq!(g.evaluate(&bars), TradeDecision::NoTrade);
        assert!(matches!(
            g.analyze(&bars),
            Err(SignalError::InsufficientData { required: 40, available: 10 })
        ));
    }

    #[test]
    fn test_long_trade_levels() {
        let g = generator(fixed_config(), 0.9);
        let bars = uptrend(100);
        let decision = g.evaluate(&bars);

        let signal = decision.signal().expect("expected a trade");
        assert_eq!(signal.direction, Direction::Long);
        assert_eq!(signal.entry_price, dec!(199));
        assert!(signal.stop_loss < signal.entry_price && signal.entry_price < signal.take_profit);
        assert_eq!(signal.stop_loss, dec!(199) * (Decimal::ONE - dec!(0.0025)));
        assert!((0.0..=1.0).contains(&signal.confidence));
    }

    #[test]
    fn test_dead_zone_yields_no_direction() {
        let g = generator(fixed_config(), 0.5);
        let evaluation = g.analyze(&uptrend(100)).unwrap();

        assert_eq!(evaluation.decision, TradeDecision::NoTrade);
        assert!(matches!(evaluation.rejection, Some(Rejection::NoDirection { .. })));
    }

    #[test]
    fn test_low_confidence_rejected() {
        let g = generator(fixed_config(), 0.9);
        let evaluation = g.analyze(&sideways(100)).unwrap();

        assert_eq!(evaluation.base_confidence, 0.0);
        assert!(matches!(evaluation.rejection, Some(Rejection::LowConfidence { .. })));
        assert!(!evaluation.decision.is_trade());
    }

    #[test]
    fn test_adaptive_confidence_is_clamped() {
        let g = generator(SignalConfig::default(), 0.9);
        let evaluation = g.analyze(&uptrend(100)).unwrap();

        // Strong trend and agreeing momentum push the product above 1
        assert_eq!(evaluation.base_confidence, 1.0);
        assert_eq!(evaluation.confidence, 1.0);
        assert!(evaluation.market.adx.unwrap() > 25.0);
        assert!(evaluation.market.momentum.unwrap() > 0.0);
    }

    #[test]
    fn test_adx_filter_rejects_weak_trend() {
        let config = SignalConfig {
            adx_threshold: 101.0,
            ..fixed_config()
        };
        let evaluation = generator(config, 0.9).analyze(&uptrend(100)).unwrap();
        assert!(matches!(evaluation.rejection, Some(Rejection::WeakTrend { .. })));
    }

    #[test]
    fn test_model_failure_is_no_trade() {
        let g = generator(fixed_config(), f64::NAN);
        assert!(g.analyze(&uptrend(100)).is_err());
        assert_eq!(g.evaluate(&uptrend(100)), TradeDecision::NoTrade);
    }

    #[test]
    fn test_uptrend_never_shorts_with_regime_filter() {
        let config = SignalConfig {
            use_regime_filter: true,
            ..Default::default()
        };
        let bearish = generator(config.clone(), 0.1);
        let bars = uptrend(100);

        for end in 1..=bars.len() {
            let decision = bearish.evaluate(&bars[..end]);
            assert_ne!(decision.direction(), Some(Direction::Short), "short at bar {end}");
        }

        let evaluation = bearish.analyze(&bars).unwrap();
        assert_eq!(evaluation.candidate, Some(Direction::Short));
        assert!(matches!(evaluation.rejection, Some(Rejection::CounterRegime { .. })));

        // The same bars do short once the regime filter is off
        let unfiltered = generator(SignalConfig::default(), 0.1);
        assert_eq!(unfiltered.evaluate(&bars).direction(), Some(Direction::Short));

        let bullish = generator(config, 0.9);
        assert_eq!(bullish.evaluate(&bars).direction(), Some(Direction::Long));
    }
}
