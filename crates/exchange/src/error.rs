use matchbook_core::Price;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("Invalid trading pair {base}/{quote}: {reason}")]
    InvalidPair {
        base: String,
        quote: String,
        reason: &'static str,
    },

    #[error("Tick size must be > 0, got {0}")]
    InvalidTickSize(Price),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, ExchangeError>;
