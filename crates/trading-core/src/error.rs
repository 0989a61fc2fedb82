//! Error types for the trading system.

use thiserror::Error;

/// Top-level trading system error.
#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Signal error: {0}")]
    Signal(#[from] SignalError),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TradingError {
    /// Errors that must stop the process instead of skipping a cycle.
    pub fn is_fatal(&self) -> bool {
        match self {
            TradingError::Config(_) => true,
            TradingError::Signal(SignalError::InvalidConfig(_)) => true,
            TradingError::Signal(SignalError::Inference(ModelError::ShapeMismatch { .. })) => true,
            TradingError::Model(ModelError::ShapeMismatch { .. }) => true,
            TradingError::Model(ModelError::UnsupportedVersion { .. }) => true,
            _ => false,
        }
    }
}

/// Signal generation errors.
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Insufficient data: need {required} bars, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Feature vector unavailable: {0}")]
    FeaturesUnavailable(String),

    #[error("Inference failed: {0}")]
    Inference(#[from] ModelError),
}

/// Predictive model errors.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Feature length mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Non-finite model output")]
    NonFinite,

    #[error("Unsupported weights version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Training error: {0}")]
    Training(String),

    #[error("Weights IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Weights serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Broker-specific errors.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Deal not found: {0}")]
    DealNotFound(String),

    #[error("Deal {reference} not confirmed after {attempts} attempts")]
    Unconfirmed { reference: String, attempts: u32 },

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    },

    #[error("API error: {0}")]
    ApiError(String),
}

/// Data source errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Data source error: {0}")]
    Internal(String),
}

/// Indicator calculation errors.
#[derive(Error, Debug)]
pub enum IndicatorError {
    #[error("Insufficient data: need {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Persistence errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage encoding error: {0}")]
    Encoding(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for trading operations.
pub type TradingResult<T> = Result<T, TradingError>;
