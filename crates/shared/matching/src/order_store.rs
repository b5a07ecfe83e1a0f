use matchbook_core::{OrderId, Quantity, RestingOrder};
use matchbook_ports::{Storage, StorageResult, WriteBatch};
use std::sync::Arc;

use crate::codec::{self, FIELD_QUANTITY};
use crate::keys::BookKeys;

/// Hash records of individual resting orders, addressed by order id
pub struct OrderStore<S> {
    store: Arc<S>,
    keys: BookKeys,
}

impl<S: Storage> OrderStore<S> {
    pub fn new(store: Arc<S>, keys: BookKeys) -> Self {
        Self { store, keys }
    }

    pub async fn get(&self, order_id: OrderId) -> StorageResult<Option<RestingOrder>> {
        let key = self.keys.order(order_id);
        let fields = self.store.hgetall(&key).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        codec::decode_order(&key, &fields).map(Some)
    }

    pub fn stage_put(&self, batch: &mut WriteBatch, order: &RestingOrder) {
        batch.hset_many(self.keys.order(order.order_id), codec::encode_order(order));
    }

    pub fn stage_quantity(&self, batch: &mut WriteBatch, order_id: OrderId, quantity: Quantity) {
        batch.hset(self.keys.order(order_id), FIELD_QUANTITY, quantity.to_string());
    }

    pub fn stage_delete(&self, batch: &mut WriteBatch, order_id: OrderId) {
        batch.delete(self.keys.order(order_id));
    }
}
