//! Configuration loading for the exchange
//!
//! A JSON document with:
//! - `retry`: timeout and backoff applied to every storage call
//! - `markets`: trading pairs opened at start-up, each with its tick size
//!
//! ```json
//! {
//!   "retry": { "timeout_ms": 250, "max_attempts": 3 },
//!   "markets": [
//!     { "base_asset": "BTC", "quote_asset": "USDT", "tick_size": "0.01" }
//!   ]
//! }
//! ```

use matchbook_core::TradingPair;
use matchbook_store::RetryPolicy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Root configuration of an exchange
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Storage timeout and retry policy
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Markets to open
    #[serde(default)]
    pub markets: Vec<MarketConfig>,
}

/// One trading pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    pub base_asset: String,
    pub quote_asset: String,
    #[serde(default = "default_tick_size")]
    pub tick_size: Decimal,
}

fn default_tick_size() -> Decimal {
    Decimal::new(1, 2)
}

impl MarketConfig {
    pub fn new(base_asset: impl Into<String>, quote_asset: impl Into<String>, tick_size: Decimal) -> Self {
        Self {
            base_asset: base_asset.into(),
            quote_asset: quote_asset.into(),
            tick_size,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let name = format!("{}/{}", self.base_asset, self.quote_asset);
        TradingPair::new(self.base_asset.as_str(), self.quote_asset.as_str())
            .map_err(|e| ConfigError::InvalidMarket(format!("{name}: {e}")))?;
        if self.tick_size <= Decimal::ZERO {
            return Err(ConfigError::InvalidMarket(format!(
                "{name}: tick size must be > 0, got {}",
                self.tick_size
            )));
        }
        Ok(())
    }
}

impl ExchangeConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_market(mut self, market: MarketConfig) -> Self {
        self.markets.push(market);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidRetry(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.timeout_ms == 0 {
            return Err(ConfigError::InvalidRetry("timeout_ms must be > 0".to_string()));
        }
        self.markets.iter().try_for_each(MarketConfig::validate)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid market config: {0}")]
    InvalidMarket(String),

    #[error("Invalid retry config: {0}")]
    InvalidRetry(String),
}
