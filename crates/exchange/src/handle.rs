use matchbook_core::{
    DepthEntry, OrderId, OrderRequest, Price, PriceLevel, Quantity, RestingOrder, Side, Trade,
    TradingPair,
};
use matchbook_matching::{OrderBook, SubmitResult};
use matchbook_ports::{BookResult, Clock, Storage, StorageResult};
use matchbook_store::RetryingStore;
use std::sync::Arc;
use tokio::sync::Mutex;

pub(crate) type SharedBook<S, C> = OrderBook<RetryingStore<S>, Arc<C>>;

/// Shared handle to one trading pair's book.
///
/// Every call holds the pair's lock for its whole duration, across all of
/// its storage round-trips, so calls on the same pair never interleave.
/// Handles to different pairs never contend.
pub struct BookHandle<S, C: Clock> {
    pair: TradingPair,
    tick_size: Price,
    book: Arc<Mutex<SharedBook<S, C>>>,
}

impl<S, C: Clock> Clone for BookHandle<S, C> {
    fn clone(&self) -> Self {
        Self {
            pair: self.pair.clone(),
            tick_size: self.tick_size,
            book: self.book.clone(),
        }
    }
}

impl<S: Storage, C: Clock> BookHandle<S, C> {
    pub(crate) fn new(book: SharedBook<S, C>) -> Self {
        Self {
            pair: book.pair().clone(),
            tick_size: book.tick_size(),
            book: Arc::new(Mutex::new(book)),
        }
    }

    pub fn pair(&self) -> &TradingPair {
        &self.pair
    }

    pub fn tick_size(&self) -> Price {
        self.tick_size
    }

    pub fn clip_price(&self, price: Price) -> Option<Price> {
        price.round_to_tick(self.tick_size)
    }

    pub async fn submit_order(&self, request: OrderRequest) -> BookResult<SubmitResult> {
        self.book.lock().await.submit_order(request).await
    }

    pub async fn cancel_order(&self, side: Side, order_id: OrderId) -> BookResult<RestingOrder> {
        self.book.lock().await.cancel_order(side, order_id).await
    }

    pub async fn update_quantity(
        &self,
        side: Side,
        order_id: OrderId,
        quantity: Quantity,
    ) -> BookResult<()> {
        self.book
            .lock()
            .await
            .update_quantity(side, order_id, quantity)
            .await
    }

    pub async fn best_bid(&self) -> StorageResult<Price> {
        self.book.lock().await.best_bid().await
    }

    pub async fn worst_bid(&self) -> StorageResult<Price> {
        self.book.lock().await.worst_bid().await
    }

    pub async fn best_ask(&self) -> StorageResult<Price> {
        self.book.lock().await.best_ask().await
    }

    pub async fn worst_ask(&self) -> StorageResult<Price> {
        self.book.lock().await.worst_ask().await
    }

    /// Best bid and best ask read under one lock
    pub async fn top_of_book(&self) -> StorageResult<(Price, Price)> {
        let book = self.book.lock().await;
        Ok((book.best_bid().await?, book.best_ask().await?))
    }

    pub async fn snapshot(
        &self,
        side: Side,
        depth: usize,
        reverse: bool,
    ) -> StorageResult<Vec<DepthEntry>> {
        self.book.lock().await.snapshot(side, depth, reverse).await
    }

    pub async fn depth(&self, side: Side, levels: usize) -> BookResult<Vec<PriceLevel>> {
        self.book.lock().await.depth(side, levels).await
    }

    pub async fn get_order(&self, side: Side, order_id: OrderId) -> StorageResult<Option<RestingOrder>> {
        self.book.lock().await.get_order(side, order_id).await
    }

    pub async fn level_count(&self, side: Side) -> StorageResult<usize> {
        self.book.lock().await.level_count(side).await
    }

    pub async fn recent_trades(&self, n: usize) -> StorageResult<Vec<Trade>> {
        self.book.lock().await.recent_trades(n).await
    }
}
