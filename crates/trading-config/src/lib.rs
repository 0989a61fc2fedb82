//! Configuration management.

mod settings;

pub use settings::{
    AppConfig, AppSettings, BrokerSettings, ExitPolicyConfig, LoggingConfig, MarketSettings,
    ModelSettings, StoreKind, StoreSettings,
};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Load configuration from an optional file and the environment.
///
/// Environment variables use the `TRADING` prefix with `__` between
/// segments, e.g. `TRADING__MARKET__SYMBOL=GBPUSD`. Missing keys take their
/// defaults.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, SettingsError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }
    let config = builder
        .add_source(
            Environment::with_prefix("TRADING")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}
