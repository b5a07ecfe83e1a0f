use serde::{Deserialize, Serialize};

use super::Side;
use crate::values::{OrderId, Price, Quantity, Timestamp, TraderId};

/// An incoming limit order.
///
/// Transient: it carries no identifier or timestamp until a remainder of it
/// starts resting in the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub side: Side,
    pub quantity: Quantity,
    pub price: Price,
    pub trader_id: TraderId,
}

impl OrderRequest {
    pub fn new(
        side: Side,
        quantity: impl Into<Quantity>,
        price: impl Into<Price>,
        trader_id: impl Into<TraderId>,
    ) -> Self {
        Self {
            side,
            quantity: quantity.into(),
            price: price.into(),
            trader_id: trader_id.into(),
        }
    }

    pub fn bid(
        quantity: impl Into<Quantity>,
        price: impl Into<Price>,
        trader_id: impl Into<TraderId>,
    ) -> Self {
        Self::new(Side::Bid, quantity, price, trader_id)
    }

    pub fn ask(
        quantity: impl Into<Quantity>,
        price: impl Into<Price>,
        trader_id: impl Into<TraderId>,
    ) -> Self {
        Self::new(Side::Ask, quantity, price, trader_id)
    }
}

/// An order stored in the book awaiting a future match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestingOrder {
    pub order_id: OrderId,
    pub side: Side,
    /// Open quantity; reduced in place by partial fills
    pub quantity: Quantity,
    pub price: Price,
    pub trader_id: TraderId,
    /// Arrival time of the incoming order this remainder came from
    pub timestamp: Timestamp,
}

impl RestingOrder {
    /// Rest the unmatched `remaining` quantity of `request`
    pub fn from_request(
        request: &OrderRequest,
        order_id: OrderId,
        remaining: Quantity,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            order_id,
            side: request.side,
            quantity: remaining,
            price: request.price,
            trader_id: request.trader_id.clone(),
            timestamp,
        }
    }
}
