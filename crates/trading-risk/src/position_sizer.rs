//! Position sizing.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Sizing and level parameters shared by every entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Fraction of balance put at risk per trade
    pub risk_per_trade: Decimal,
    /// Stop-loss distance as a fraction of entry price
    pub stop_loss_pct: Decimal,
    /// Take-profit distance as a fraction of entry price
    pub take_profit_pct: Decimal,
    pub min_size: Decimal,
    pub max_size: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_per_trade: dec!(0.05),
            stop_loss_pct: dec!(0.0025),
            take_profit_pct: dec!(0.0075),
            min_size: dec!(0.01),
            max_size: dec!(0.5),
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), String> {
        let unit = |name: &str, v: Decimal| {
            if v <= Decimal::ZERO || v >= Decimal::ONE {
                Err(format!("{name} must be in (0, 1), got {v}"))
            } else {
                Ok(())
            }
        };
        unit("risk_per_trade", self.risk_per_trade)?;
        unit("stop_loss_pct", self.stop_loss_pct)?;
        unit("take_profit_pct", self.take_profit_pct)?;
        if self.min_size <= Decimal::ZERO || self.min_size > self.max_size {
            return Err(format!(
                "size bounds invalid: min {} max {}",
                self.min_size, self.max_size
            ));
        }
        Ok(())
    }
}

/// Risk-based position sizer.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    risk_per_trade: Decimal,
    stop_loss_pct: Decimal,
    min_size: Decimal,
    max_size: Decimal,
}

impl PositionSizer {
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            risk_per_trade: config.risk_per_trade,
            stop_loss_pct: config.stop_loss_pct,
            min_size: config.min_size,
            max_size: config.max_size,
        }
    }

    /// `balance * risk / (price * stop_pct)`, clamped to the size bounds.
    ///
    /// Returns zero when balance or price is not positive; the caller must
    /// not place an order in that case.
    pub fn calculate(&self, balance: Decimal, price: Decimal) -> Decimal {
        if balance <= Decimal::ZERO || price <= Decimal::ZERO || self.stop_loss_pct <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let risk_amount = balance * self.risk_per_trade;
        let size = risk_amount / (price * self.stop_loss_pct);
        size.max(self.min_size).min(self.max_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizer() -> PositionSizer {
        PositionSizer::new(&RiskConfig::default())
    }

    #[test]
    fn test_clamped_to_max() {
        // 1000 * 0.05 / (100 * 0.0025) = 200 -> 0.5
        assert_eq!(sizer().calculate(dec!(1000), dec!(100)), dec!(0.5));
    }

    #[test]
    fn test_unclamped() {
        // 10 * 0.05 / (5000 * 0.0025) = 0.04
        assert_eq!(sizer().calculate(dec!(10), dec!(5000)), dec!(0.04));
    }

    #[test]
    fn test_clamped_to_min() {
        assert_eq!(sizer().calculate(dec!(1), dec!(60000)), dec!(0.01));
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(sizer().calculate(Decimal::ZERO, dec!(100)), Decimal::ZERO);
        assert_eq!(sizer().calculate(dec!(-5), dec!(100)), Decimal::ZERO);
        assert_eq!(sizer().calculate(dec!(1000), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_config_validation() {
        assert!(RiskConfig::default().validate().is_ok());

        let config = RiskConfig {
            stop_loss_pct: dec!(1.5),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RiskConfig {
            min_size: dec!(2),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
