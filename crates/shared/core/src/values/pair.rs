use serde::{Deserialize, Serialize};
use std::fmt;

/// A trading pair identified by its base and quote assets (e.g. BTC/USDT)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    base: String,
    quote: String,
}

impl TradingPair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Result<Self, &'static str> {
        let base = Self::validate_asset(base.into())?;
        let quote = Self::validate_asset(quote.into())?;
        if base == quote {
            return Err("Base and quote assets must differ");
        }
        Ok(TradingPair { base, quote })
    }

    fn validate_asset(asset: String) -> Result<String, &'static str> {
        if asset.is_empty() {
            return Err("Asset cannot be empty");
        }
        if asset.len() > 12 {
            return Err("Asset too long (max 12 chars)");
        }
        // Assets end up inside storage keys joined with '-'
        if !asset.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err("Asset must be alphanumeric");
        }
        Ok(asset.to_uppercase())
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// `BASE-QUOTE`, the form used inside storage keys
    pub fn key_fragment(&self) -> String {
        format!("{}-{}", self.base, self.quote)
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}
