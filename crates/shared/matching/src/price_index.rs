use log::{debug, warn};
use matchbook_core::{DepthEntry, OrderId, Price, PriceLevel, Quantity, RestingOrder, Side};
use matchbook_ports::{
    BookError, BookResult, ScoreOrder, Storage, StorageError, StorageResult, WriteBatch,
};
use std::str::FromStr;
use std::sync::Arc;

use crate::keys::BookKeys;
use crate::order_store::OrderStore;

/// One side of the book: price levels in a sorted set, each level a FIFO
/// list of order ids, each order a hash record.
///
/// Best price is the highest level for bids and the lowest for asks. Both
/// ends are read with a single bounded range query on the sorted set.
pub struct PriceIndex<S> {
    side: Side,
    store: Arc<S>,
    keys: BookKeys,
    orders: OrderStore<S>,
}

impl<S: Storage> PriceIndex<S> {
    pub fn new(side: Side, store: Arc<S>, keys: BookKeys) -> Self {
        let orders = OrderStore::new(store.clone(), keys.clone());
        Self {
            side,
            store,
            keys,
            orders,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    fn best_first(&self) -> ScoreOrder {
        if self.side.best_is_highest() {
            ScoreOrder::Descending
        } else {
            ScoreOrder::Ascending
        }
    }

    fn worst_first(&self) -> ScoreOrder {
        match self.best_first() {
            ScoreOrder::Ascending => ScoreOrder::Descending,
            ScoreOrder::Descending => ScoreOrder::Ascending,
        }
    }

    async fn first_level(&self, offset: usize, order: ScoreOrder) -> StorageResult<Option<Price>> {
        let members = self
            .store
            .zrange(&self.keys.prices(self.side), offset, Some(1), order)
            .await?;
        Ok(members.first().map(|m| Price::from(m.score)))
    }

    /// Best price, or `Price::ZERO` when the side is empty
    pub async fn best_price(&self) -> StorageResult<Price> {
        Ok(self.first_level(0, self.best_first()).await?.unwrap_or(Price::ZERO))
    }

    /// Worst price, or `Price::ZERO` when the side is empty
    pub async fn worst_price(&self) -> StorageResult<Price> {
        Ok(self.first_level(0, self.worst_first()).await?.unwrap_or(Price::ZERO))
    }

    /// The `offset`-th best level (0 is the best)
    pub async fn level_at(&self, offset: usize) -> StorageResult<Option<Price>> {
        self.first_level(offset, self.best_first()).await
    }

    /// Up to `limit` level prices in the given score order
    pub async fn levels(&self, limit: Option<usize>, order: ScoreOrder) -> StorageResult<Vec<Price>> {
        let members = self
            .store
            .zrange(&self.keys.prices(self.side), 0, limit, order)
            .await?;
        Ok(members.into_iter().map(|m| Price::from(m.score)).collect())
    }

    pub async fn level_count(&self) -> StorageResult<usize> {
        self.store.zcard(&self.keys.prices(self.side)).await
    }

    pub async fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.level_count().await? == 0)
    }

    /// Order ids queued at `price`, in time priority
    pub async fn order_ids_at(&self, price: Price) -> StorageResult<Vec<OrderId>> {
        let key = self.keys.level(self.side, price);
        self.store
            .lrange(&key, 0, -1)
            .await?
            .iter()
            .map(|raw| {
                OrderId::from_str(raw)
                    .map_err(|e| StorageError::corrupted(&key, format!("invalid order id {raw}: {e}")))
            })
            .collect()
    }

    /// Resting orders at `price`, in time priority.
    ///
    /// Ids whose record has vanished are skipped.
    pub async fn orders_at(&self, price: Price) -> StorageResult<Vec<RestingOrder>> {
        let ids = self.order_ids_at(price).await?;
        let mut orders = Vec::with_capacity(ids.len());
        for order_id in ids {
            match self.orders.get(order_id).await? {
                Some(order) => orders.push(order),
                None => warn!(
                    "side={} price={} order_id={} queued without a record",
                    self.side, price, order_id
                ),
            }
        }
        Ok(orders)
    }

    /// A resting order of this side
    pub async fn get(&self, order_id: OrderId) -> StorageResult<Option<RestingOrder>> {
        Ok(self
            .orders
            .get(order_id)
            .await?
            .filter(|order| order.side == self.side))
    }

    fn not_found(&self, order_id: OrderId) -> BookError {
        BookError::NotFound {
            side: self.side,
            order_id,
        }
    }

    /// Rest `order` at the tail of its price level, creating the level if
    /// needed
    pub async fn insert(&self, order: &RestingOrder) -> BookResult<()> {
        if !order.price.is_positive() {
            return Err(BookError::OrderPrice(order.price));
        }
        if !order.quantity.is_positive() {
            return Err(BookError::OrderQuantity(order.quantity));
        }
        let mut batch = WriteBatch::new();
        self.stage_insert(&mut batch, order);
        self.store.commit(batch).await?;
        Ok(())
    }

    pub async fn remove(&self, order_id: OrderId) -> BookResult<RestingOrder> {
        let order = self
            .get(order_id)
            .await?
            .ok_or_else(|| self.not_found(order_id))?;

        let live = self.orders_at(order.price).await?;
        let empties_level = live.iter().all(|o| o.order_id == order_id);

        let mut batch = WriteBatch::new();
        self.stage_remove(&mut batch, &order, empties_level);
        self.store.commit(batch).await?;
        debug!(
            "side={} price={} order_id={} removed",
            self.side, order.price, order_id
        );
        Ok(order)
    }

    /// Set the open quantity of a resting order in place, keeping its queue
    /// position. A quantity of zero removes the order.
    pub async fn update_quantity(&self, order_id: OrderId, quantity: Quantity) -> BookResult<()> {
        if quantity < Quantity::ZERO {
            return Err(BookError::OrderQuantity(quantity));
        }
        if quantity.is_zero() {
            return self.remove(order_id).await.map(|_| ());
        }
        if self.get(order_id).await?.is_none() {
            return Err(self.not_found(order_id));
        }
        let mut batch = WriteBatch::new();
        self.orders.stage_quantity(&mut batch, order_id, quantity);
        self.store.commit(batch).await?;
        Ok(())
    }

    /// Per-order entries of up to `depth` levels, ascending by price unless
    /// `reverse`
    pub async fn snapshot(&self, depth: usize, reverse: bool) -> StorageResult<Vec<DepthEntry>> {
        let order = if reverse {
            ScoreOrder::Descending
        } else {
            ScoreOrder::Ascending
        };
        let mut entries = Vec::new();
        for price in self.levels(Some(depth), order).await? {
            entries.extend(self.orders_at(price).await?.into_iter().map(|o| DepthEntry {
                price: o.price,
                quantity: o.quantity,
            }));
        }
        Ok(entries)
    }

    /// Aggregated quantity of the best `levels` price levels, best first
    pub async fn depth(&self, levels: usize) -> BookResult<Vec<PriceLevel>> {
        let mut depth = Vec::new();
        for price in self.levels(Some(levels), self.best_first()).await? {
            let orders = self.orders_at(price).await?;
            if orders.is_empty() {
                continue;
            }
            let quantity = orders
                .iter()
                .try_fold(Quantity::ZERO, |total, o| total.checked_add(o.quantity))
                .ok_or(BookError::QuantityOverflow {
                    side: self.side,
                    price,
                })?;
            depth.push(PriceLevel::new(price, quantity, orders.len()));
        }
        Ok(depth)
    }

    pub(crate) fn stage_insert(&self, batch: &mut WriteBatch, order: &RestingOrder) {
        debug_assert_eq!(order.side, self.side);
        batch
            .zadd(
                self.keys.prices(self.side),
                order.price.to_key(),
                order.price.inner(),
            )
            .rpush(
                self.keys.level(self.side, order.price),
                order.order_id.to_string(),
            );
        self.orders.stage_put(batch, order);
    }

    /// Unqueue `order` and delete its record. When no other live order is
    /// left at its price, the whole level goes, dangling ids included.
    pub(crate) fn stage_remove(&self, batch: &mut WriteBatch, order: &RestingOrder, empties_level: bool) {
        if empties_level {
            self.stage_drop_level(batch, order.price);
        } else {
            batch.lrem(
                self.keys.level(self.side, order.price),
                order.order_id.to_string(),
            );
        }
        self.orders.stage_delete(batch, order.order_id);
    }

    pub(crate) fn stage_fill(&self, batch: &mut WriteBatch, order_id: OrderId, remaining: Quantity) {
        self.orders.stage_quantity(batch, order_id, remaining);
    }

    /// Drop a level and whatever is left of its queue
    pub(crate) fn stage_drop_level(&self, batch: &mut WriteBatch, price: Price) {
        batch
            .zrem(self.keys.prices(self.side), price.to_key())
            .delete(self.keys.level(self.side, price));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use matchbook_core::TradingPair;
    use matchbook_store::InMemoryStore;
    use rust_decimal_macros::dec;

    fn index(side: Side) -> (Arc<InMemoryStore>, PriceIndex<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let keys = BookKeys::new(&TradingPair::new("BTC", "USD").unwrap());
        (store.clone(), PriceIndex::new(side, store, keys))
    }

    fn order(id: u64, side: Side, qty: rust_decimal::Decimal, price: rust_decimal::Decimal) -> RestingOrder {
        RestingOrder {
            order_id: OrderId::new(id),
            side,
            quantity: Quantity::from(qty),
            price: Price::from(price),
            trader_id: format!("trader-{id}"),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_empty_index_reports_zero_sentinel() {
        let (_, bids) = index(Side::Bid);
        assert_eq!(bids.best_price().await.unwrap(), Price::ZERO);
        assert_eq!(bids.worst_price().await.unwrap(), Price::ZERO);
        assert!(bids.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_best_and_worst_follow_side() {
        let (store, bids) = index(Side::Bid);
        let asks = PriceIndex::new(
            Side::Ask,
            store,
            BookKeys::new(&TradingPair::new("BTC", "USD").unwrap()),
        );
        for (id, price) in [(1, dec!(940)), (2, dec!(960)), (3, dec!(950))] {
            bids.insert(&order(id, Side::Bid, dec!(1), price)).await.unwrap();
            asks.insert(&order(id + 10, Side::Ask, dec!(1), price + dec!(100)))
                .await
                .unwrap();
        }

        assert_eq!(bids.best_price().await.unwrap(), Price::from(dec!(960)));
        assert_eq!(bids.worst_price().await.unwrap(), Price::from(dec!(940)));
        assert_eq!(asks.best_price().await.unwrap(), Price::from(dec!(1040)));
        assert_eq!(asks.worst_price().await.unwrap(), Price::from(dec!(1060)));
        assert_eq!(bids.level_at(1).await.unwrap(), Some(Price::from(dec!(950))));
        assert_eq!(bids.level_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_orders_at_keeps_arrival_order() {
        let (_, asks) = index(Side::Ask);
        for id in [4, 2, 9] {
            asks.insert(&order(id, Side::Ask, dec!(1), dec!(960))).await.unwrap();
        }
        // Same level under a different scale
        asks.insert(&order(5, Side::Ask, dec!(1), dec!(960.00))).await.unwrap();

        let ids: Vec<u64> = asks
            .orders_at(Price::from(dec!(960)))
            .await
            .unwrap()
            .iter()
            .map(|o| o.order_id.value())
            .collect();
        assert_eq!(ids, vec![4, 2, 9, 5]);
        assert_eq!(asks.level_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_last_order_deletes_level() {
        let (store, asks) = index(Side::Ask);
        asks.insert(&order(1, Side::Ask, dec!(1), dec!(960))).await.unwrap();
        asks.insert(&order(2, Side::Ask, dec!(1), dec!(960))).await.unwrap();

        asks.remove(OrderId::new(1)).await.unwrap();
        assert_eq!(asks.level_count().await.unwrap(), 1);

        let removed = asks.remove(OrderId::new(2)).await.unwrap();
        assert_eq!(removed.order_id, OrderId::new(2));
        assert_eq!(asks.level_count().await.unwrap(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_remove_unknown_or_other_side_is_not_found() {
        let (store, asks) = index(Side::Ask);
        asks.insert(&order(1, Side::Ask, dec!(1), dec!(960))).await.unwrap();
        let before = store.keys();

        let bids = PriceIndex::new(
            Side::Bid,
            store.clone(),
            BookKeys::new(&TradingPair::new("BTC", "USD").unwrap()),
        );
        assert_eq!(
            bids.remove(OrderId::new(1)).await.unwrap_err(),
            BookError::NotFound {
                side: Side::Bid,
                order_id: OrderId::new(1)
            }
        );
        assert!(matches!(
            asks.remove(OrderId::new(7)).await,
            Err(BookError::NotFound { .. })
        ));
        assert_eq!(store.keys(), before);
    }

    #[tokio::test]
    async fn test_update_quantity_keeps_queue_position() {
        let (_, bids) = index(Side::Bid);
        for id in 1..=3 {
            bids.insert(&order(id, Side::Bid, dec!(5), dec!(960))).await.unwrap();
        }

        bids.update_quantity(OrderId::new(1), Quantity::from(dec!(2)))
            .await
            .unwrap();
        let level = bids.orders_at(Price::from(dec!(960))).await.unwrap();
        assert_eq!(level[0].order_id, OrderId::new(1));
        assert_eq!(level[0].quantity, Quantity::from(dec!(2)));

        bids.update_quantity(OrderId::new(2), Quantity::ZERO).await.unwrap();
        assert!(bids.get(OrderId::new(2)).await.unwrap().is_none());

        assert!(matches!(
            bids.update_quantity(OrderId::new(3), Quantity::from(dec!(-1))).await,
            Err(BookError::OrderQuantity(_))
        ));
        assert!(matches!(
            bids.update_quantity(OrderId::new(8), Quantity::from(dec!(1))).await,
            Err(BookError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_insert_rejects_non_positive_values() {
        let (store, bids) = index(Side::Bid);
        assert!(matches!(
            bids.insert(&order(1, Side::Bid, dec!(1), dec!(0))).await,
            Err(BookError::OrderPrice(_))
        ));
        assert!(matches!(
            bids.insert(&order(1, Side::Bid, dec!(0), dec!(960))).await,
            Err(BookError::OrderQuantity(_))
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_and_depth_views() {
        let (_, asks) = index(Side::Ask);
        asks.insert(&order(1, Side::Ask, dec!(1), dec!(970))).await.unwrap();
        asks.insert(&order(2, Side::Ask, dec!(2), dec!(960))).await.unwrap();
        asks.insert(&order(3, Side::Ask, dec!(3), dec!(960))).await.unwrap();
        asks.insert(&order(4, Side::Ask, dec!(4), dec!(980))).await.unwrap();

        let snapshot = asks.snapshot(2, false).await.unwrap();
        let view: Vec<_> = snapshot
            .iter()
            .map(|e| (e.price.inner(), e.quantity.inner()))
            .collect();
        assert_eq!(view, vec![(dec!(960), dec!(2)), (dec!(960), dec!(3)), (dec!(970), dec!(1))]);

        let reversed = asks.snapshot(1, true).await.unwrap();
        assert_eq!(reversed.len(), 1);
        assert_eq!(reversed[0].price, Price::from(dec!(980)));

        let depth = asks.depth(2).await.unwrap();
        assert_eq!(depth[0], PriceLevel::new(Price::from(dec!(960)), Quantity::from(dec!(5)), 2));
        assert_eq!(depth[1].price, Price::from(dec!(970)));
    }
}
