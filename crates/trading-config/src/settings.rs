//! Configuration structures.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use trading_core::types::Timeframe;
use trading_ledger::SessionConfig;
use trading_model::TrainingConfig;
use trading_risk::{ExitPolicyKind, RiskConfig};
use trading_signals::SignalConfig;

use crate::SettingsError;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub market: MarketSettings,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub exit: ExitPolicyConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub broker: BrokerSettings,
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "signal-trader".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// Additional JSON log file
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Instrument and market data settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSettings {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Bars requested when loading history
    pub history_bars: usize,
    /// Quotes closer together than this are skipped
    pub quote_throttle_ms: i64,
    /// Interval of the history reload
    pub history_refresh_secs: u64,
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            symbol: "EURUSD".to_string(),
            timeframe: Timeframe::Minute1,
            history_bars: 1000,
            quote_throttle_ms: 5000,
            history_refresh_secs: 300,
        }
    }
}

/// Exit policy selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExitPolicyConfig {
    pub policy: ExitPolicyKind,
}

/// Order confirmation and paper account settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerSettings {
    pub confirm_attempts: u32,
    pub confirm_delay_ms: u64,
    pub paper_balance: Decimal,
    pub paper_slippage_pct: Decimal,
    /// Ask minus bid on replayed quotes
    pub paper_spread: f64,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            confirm_attempts: 2,
            confirm_delay_ms: 1000,
            paper_balance: dec!(10000),
            paper_slippage_pct: Decimal::ZERO,
            paper_spread: 0.0,
        }
    }
}

/// Model weights and training settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub weights_path: PathBuf,
    /// Bars ahead used for training labels
    pub prediction_horizon: usize,
    pub training: TrainingConfig,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            weights_path: PathBuf::from("models/branch_mlp.json"),
            prediction_horizon: 5,
            training: TrainingConfig::default(),
        }
    }
}

/// Trade store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Memory,
    #[default]
    Jsonl,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub kind: StoreKind,
    /// Event log path for the `jsonl` store
    pub path: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            kind: StoreKind::Jsonl,
            path: PathBuf::from("data/trades.jsonl"),
        }
    }
}

impl AppConfig {
    /// Report problems that would make the engine unusable.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |section: &str, msg: String| Err(SettingsError::Invalid(format!("[{}] {}", section, msg)));

        if self.market.symbol.trim().is_empty() {
            return invalid("market", "symbol must not be empty".into());
        }
        if self.market.quote_throttle_ms < 0 {
            return invalid("market", "quote_throttle_ms cannot be negative".into());
        }
        if self.market.history_refresh_secs == 0 {
            return invalid("market", "history_refresh_secs must be positive".into());
        }
        if let Err(e) = self.signal.validate() {
            return invalid("signal", e.to_string());
        }
        let window = self.signal.feature_window(self.market.timeframe, 0);
        if self.market.history_bars < window {
            return invalid(
                "market",
                format!("history_bars {} is shorter than the feature window {}", self.market.history_bars, window),
            );
        }
        if let Err(e) = self.risk.validate() {
            return invalid("risk", e);
        }
        if let Err(e) = self.session.validate() {
            return invalid("session", e);
        }
        if self.broker.confirm_attempts == 0 {
            return invalid("broker", "confirm_attempts must be at least 1".into());
        }
        if self.broker.paper_balance <= Decimal::ZERO {
            return invalid("broker", format!("paper_balance must be positive, got {}", self.broker.paper_balance));
        }
        if self.broker.paper_slippage_pct < Decimal::ZERO {
            return invalid("broker", "paper_slippage_pct cannot be negative".into());
        }
        if self.model.prediction_horizon == 0 {
            return invalid("model", "prediction_horizon must be positive".into());
        }
        if let Err(e) = self.model.training.validate() {
            return invalid("model", e.to_string());
        }
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
