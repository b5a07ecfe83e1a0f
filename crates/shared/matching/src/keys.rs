use matchbook_core::{OrderId, Price, Side, TradingPair};

/// Storage key layout of one trading pair's book
///
/// ```text
/// prices-BASE-QUOTE-bid      sorted set of bid levels (score = price)
/// bid-BASE-QUOTE-960         FIFO list of order ids resting at 960
/// quote-BASE-QUOTE-17        hash record of order 17
/// counter:BASE-QUOTE-order_id
/// tape-BASE-QUOTE            JSON trades, oldest first
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookKeys {
    pair: String,
}

impl BookKeys {
    pub fn new(pair: &TradingPair) -> Self {
        Self {
            pair: pair.key_fragment(),
        }
    }

    pub fn prices(&self, side: Side) -> String {
        format!("prices-{}-{}", self.pair, side)
    }

    pub fn level(&self, side: Side, price: Price) -> String {
        format!("{}-{}-{}", side, self.pair, price.to_key())
    }

    pub fn order(&self, order_id: OrderId) -> String {
        format!("quote-{}-{}", self.pair, order_id)
    }

    pub fn counter(&self) -> String {
        format!("counter:{}-order_id", self.pair)
    }

    pub fn tape(&self) -> String {
        format!("tape-{}", self.pair)
    }
}
