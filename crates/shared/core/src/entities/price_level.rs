use serde::{Deserialize, Serialize};

use crate::values::{Price, Quantity};

/// Aggregated quantity resting at one price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Price,
    pub quantity: Quantity,
    pub order_count: usize,
}

impl PriceLevel {
    pub fn new(price: Price, quantity: Quantity, order_count: usize) -> Self {
        Self {
            price,
            quantity,
            order_count,
        }
    }
}

/// One resting order as shown in a market-data snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthEntry {
    pub price: Price,
    pub quantity: Quantity,
}
