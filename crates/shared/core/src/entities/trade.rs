use serde::{Deserialize, Serialize};

use super::{RestingOrder, Side};
use crate::values::{OrderId, Price, Quantity, Timestamp, TraderId};

/// Trade resulting from an incoming order consuming resting quantity.
///
/// Parties are keyed by side. The maker (resting) order id is always known;
/// the taker's order id is not, since it is only assigned if a remainder of
/// the taker rests afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Execution price, always the maker's price
    pub price: Price,
    pub quantity: Quantity,
    pub timestamp: Timestamp,
    /// Side of the resting order
    pub maker_side: Side,
    pub bid_side_trader_id: TraderId,
    pub bid_side_order_id: Option<OrderId>,
    pub ask_side_trader_id: TraderId,
    pub ask_side_order_id: Option<OrderId>,
}

impl Trade {
    /// Record a fill of `quantity` between a resting `maker` and an incoming
    /// order from `taker_trader_id`
    pub fn new(
        maker: &RestingOrder,
        taker_trader_id: &str,
        quantity: Quantity,
        timestamp: Timestamp,
    ) -> Self {
        let maker_trader = maker.trader_id.clone();
        let taker_trader = taker_trader_id.to_string();

        let (bid_trader, bid_order, ask_trader, ask_order) = match maker.side {
            Side::Bid => (maker_trader, Some(maker.order_id), taker_trader, None),
            Side::Ask => (taker_trader, None, maker_trader, Some(maker.order_id)),
        };

        Self {
            price: maker.price,
            quantity,
            timestamp,
            maker_side: maker.side,
            bid_side_trader_id: bid_trader,
            bid_side_order_id: bid_order,
            ask_side_trader_id: ask_trader,
            ask_side_order_id: ask_order,
        }
    }

    /// Side of the incoming order
    pub fn taker_side(&self) -> Side {
        self.maker_side.opposite()
    }

    pub fn maker_trader_id(&self) -> &str {
        match self.maker_side {
            Side::Bid => &self.bid_side_trader_id,
            Side::Ask => &self.ask_side_trader_id,
        }
    }

    pub fn taker_trader_id(&self) -> &str {
        match self.maker_side {
            Side::Bid => &self.ask_side_trader_id,
            Side::Ask => &self.bid_side_trader_id,
        }
    }

    pub fn maker_order_id(&self) -> Option<OrderId> {
        match self.maker_side {
            Side::Bid => self.bid_side_order_id,
            Side::Ask => self.ask_side_order_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn resting_ask() -> RestingOrder {
        RestingOrder {
            order_id: OrderId::new(1),
            side: Side::Ask,
            quantity: Quantity::from(dec!(5)),
            price: Price::from(dec!(960)),
            trader_id: "Alice".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_trade_parties_keyed_by_side() {
        let maker = resting_ask();
        let trade = Trade::new(&maker, "Bob", Quantity::from(dec!(2)), Utc::now());

        assert_eq!(trade.price, Price::from(dec!(960)));
        assert_eq!(trade.ask_side_trader_id, "Alice");
        assert_eq!(trade.ask_side_order_id, Some(OrderId::new(1)));
        assert_eq!(trade.bid_side_trader_id, "Bob");
        assert_eq!(trade.bid_side_order_id, None);
        assert_eq!(trade.taker_side(), Side::Bid);
        assert_eq!(trade.maker_trader_id(), "Alice");
        assert_eq!(trade.taker_trader_id(), "Bob");
        assert_eq!(trade.maker_order_id(), Some(OrderId::new(1)));
    }

    #[test]
    fn test_trade_json_schema() {
        let trade = Trade::new(&resting_ask(), "Bob", Quantity::from(dec!(2)), Utc::now());
        let json = serde_json::to_value(&trade).unwrap();

        assert_eq!(json["maker_side"], "ask");
        assert_eq!(json["ask_side_order_id"], 1);
        assert!(json["bid_side_order_id"].is_null());

        let back: Trade = serde_json::from_value(json).unwrap();
        assert_eq!(back, trade);
    }
}
