use log::{debug, error, warn};
use matchbook_clock::MonotonicClock;
use matchbook_core::{
    DepthEntry, OrderId, OrderRequest, Price, PriceLevel, Quantity, RestingOrder, Side,
    Trade, TradingPair,
};
use matchbook_ports::{BookError, BookResult, Clock, Storage, StorageResult, WriteBatch};
use std::sync::Arc;

use crate::keys::BookKeys;
use crate::price_index::PriceIndex;
use crate::sequence::SequenceGenerator;
use crate::tape::TradeTape;

/// Outcome of one `submit_order` call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmitResult {
    /// Fills in execution order
    pub trades: Vec<Trade>,
    /// The unmatched remainder, if any, now resting on the order's own side
    pub resting: Option<RestingOrder>,
}

impl SubmitResult {
    pub fn traded_quantity(&self) -> Quantity {
        self.trades.iter().map(|t| t.quantity).sum()
    }

    pub fn is_fully_filled(&self) -> bool {
        self.resting.is_none() && !self.trades.is_empty()
    }
}

/// Limit order book of one trading pair with price-time priority matching.
///
/// All state lives in the backing store. Mutating calls take `&mut self`:
/// one call must run to completion before the next starts on the same pair,
/// which callers sharing a book get by wrapping it in a lock.
pub struct OrderBook<S, C: Clock> {
    pair: TradingPair,
    tick_size: Price,
    store: Arc<S>,
    bids: PriceIndex<S>,
    asks: PriceIndex<S>,
    sequence: SequenceGenerator<S>,
    tape: TradeTape<S>,
    clock: MonotonicClock<C>,
}

impl<S, C: Clock> std::fmt::Debug for OrderBook<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("pair", &self.pair)
            .field("tick_size", &self.tick_size)
            .field("clock", &self.clock.name())
            .finish()
    }
}

impl<S: Storage, C: Clock> OrderBook<S, C> {
    pub fn new(pair: TradingPair, tick_size: Price, store: Arc<S>, clock: C) -> Self {
        let keys = BookKeys::new(&pair);
        Self {
            bids: PriceIndex::new(Side::Bid, store.clone(), keys.clone()),
            asks: PriceIndex::new(Side::Ask, store.clone(), keys.clone()),
            sequence: SequenceGenerator::new(store.clone(), keys.counter()),
            tape: TradeTape::new(store.clone(), keys.tape()),
            clock: MonotonicClock::new(clock),
            pair,
            tick_size,
            store,
        }
    }

    pub fn pair(&self) -> &TradingPair {
        &self.pair
    }

    pub fn tick_size(&self) -> Price {
        self.tick_size
    }

    /// Round `price` down to the tick grid of this pair; `None` when the
    /// price is too large to express in ticks
    pub fn clip_price(&self, price: Price) -> Option<Price> {
        price.round_to_tick(self.tick_size)
    }

    pub fn index(&self, side: Side) -> &PriceIndex<S> {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    /// Match an incoming limit order and rest its remainder.
    ///
    /// The call reads the book, stages every mutation in one batch and
    /// commits it at the end, so the book either reflects the whole call or
    /// none of it. On `BookError::Storage` the caller cannot tell whether a
    /// timed-out commit landed and must re-read the book before retrying.
    pub async fn submit_order(&mut self, request: OrderRequest) -> BookResult<SubmitResult> {
        if !request.quantity.is_positive() {
            return Err(BookError::OrderQuantity(request.quantity));
        }
        if !request.price.is_positive() {
            return Err(BookError::OrderPrice(request.price));
        }

        let arrival = self.clock.now();
        let mut batch = WriteBatch::new();
        let trades = self.plan_matches(&request, &mut batch).await?;

        let traded: Quantity = trades.iter().map(|t| t.quantity).sum();
        let remaining = request.quantity - traded;
        let resting = if remaining.is_positive() {
            let order_id = self.sequence.next_id().await?;
            let order = RestingOrder::from_request(&request, order_id, remaining, arrival);
            self.index(request.side).stage_insert(&mut batch, &order);
            Some(order)
        } else {
            None
        };

        for trade in &trades {
            self.tape.stage_append(&mut batch, trade)?;
        }

        if let Err(err) = self.store.commit(batch).await {
            error!(
                "pair={} side={} qty={} price={} commit failed: {}",
                self.pair, request.side, request.quantity, request.price, err
            );
            return Err(err.into());
        }

        for trade in &trades {
            debug!(
                "pair={} trade price={} qty={} maker_side={} bid={} ask={}",
                self.pair,
                trade.price,
                trade.quantity,
                trade.maker_side,
                trade.bid_side_trader_id,
                trade.ask_side_trader_id
            );
        }
        if let Some(order) = &resting {
            debug!(
                "pair={} order_id={} side={} qty={} price={} resting",
                self.pair, order.order_id, order.side, order.quantity, order.price
            );
        }

        Ok(SubmitResult { trades, resting })
    }

    /// Walk the opposite side best level first, staging fills into `batch`.
    ///
    /// Levels consumed in full are staged for removal and skipped with an
    /// offset, since the store still lists them until the batch commits.
    async fn plan_matches(
        &self,
        request: &OrderRequest,
        batch: &mut WriteBatch,
    ) -> BookResult<Vec<Trade>> {
        let opposite = self.index(request.side.opposite());
        let mut remaining = request.quantity;
        let mut trades = Vec::new();
        let mut consumed_levels = 0;

        while remaining.is_positive() {
            let Some(level_price) = opposite.level_at(consumed_levels).await? else {
                break;
            };
            if !request.side.crosses(request.price, level_price) {
                break;
            }

            let makers = opposite.orders_at(level_price).await?;
            if makers.is_empty() {
                warn!(
                    "pair={} side={} price={} dropping empty level",
                    self.pair,
                    opposite.side(),
                    level_price
                );
                opposite.stage_drop_level(batch, level_price);
                consumed_levels += 1;
                continue;
            }

            let mut filled = 0;
            for maker in &makers {
                if !remaining.is_positive() {
                    break;
                }
                let quantity = remaining.min(maker.quantity);
                remaining -= quantity;
                trades.push(Trade::new(maker, &request.trader_id, quantity, self.clock.now()));

                if quantity < maker.quantity {
                    opposite.stage_fill(batch, maker.order_id, maker.quantity - quantity);
                } else {
                    filled += 1;
                    opposite.stage_remove(batch, maker, filled == makers.len());
                }
            }

            if filled < makers.len() {
                break;
            }
            consumed_levels += 1;
        }

        Ok(trades)
    }

    /// Remove a resting order from `side`.
    ///
    /// Fails with `NotFound` if the order is not resting on that side,
    /// including when it was matched away before the cancel ran.
    pub async fn cancel_order(&mut self, side: Side, order_id: OrderId) -> BookResult<RestingOrder> {
        let order = self.index(side).remove(order_id).await?;
        debug!(
            "pair={} order_id={} side={} qty={} price={} cancelled",
            self.pair, order_id, side, order.quantity, order.price
        );
        Ok(order)
    }

    /// Change the open quantity of a resting order without losing its queue
    /// position; zero removes it
    pub async fn update_quantity(
        &mut self,
        side: Side,
        order_id: OrderId,
        quantity: Quantity,
    ) -> BookResult<()> {
        self.index(side).update_quantity(order_id, quantity).await
    }

    pub async fn best_bid(&self) -> StorageResult<Price> {
        self.bids.best_price().await
    }

    pub async fn worst_bid(&self) -> StorageResult<Price> {
        self.bids.worst_price().await
    }

    pub async fn best_ask(&self) -> StorageResult<Price> {
        self.asks.best_price().await
    }

    pub async fn worst_ask(&self) -> StorageResult<Price> {
        self.asks.worst_price().await
    }

    /// Per-order view of up to `depth` levels of one side, ascending by
    /// price unless `reverse`, FIFO within a level
    pub async fn snapshot(
        &self,
        side: Side,
        depth: usize,
        reverse: bool,
    ) -> StorageResult<Vec<DepthEntry>> {
        self.index(side).snapshot(depth, reverse).await
    }

    /// Aggregated view of the best `levels` levels of one side
    pub async fn depth(&self, side: Side, levels: usize) -> BookResult<Vec<PriceLevel>> {
        self.index(side).depth(levels).await
    }

    pub async fn get_order(&self, side: Side, order_id: OrderId) -> StorageResult<Option<RestingOrder>> {
        self.index(side).get(order_id).await
    }

    pub async fn level_count(&self, side: Side) -> StorageResult<usize> {
        self.index(side).level_count().await
    }

    /// The last `n` trades, oldest first
    pub async fn recent_trades(&self, n: usize) -> StorageResult<Vec<Trade>> {
        self.tape.recent(n).await
    }

    /// Last order id handed out
    pub async fn last_order_id(&self) -> StorageResult<u64> {
        self.sequence.current().await
    }
}
