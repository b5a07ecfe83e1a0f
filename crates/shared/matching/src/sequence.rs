use matchbook_core::OrderId;
use matchbook_ports::{Storage, StorageError, StorageResult};
use std::sync::Arc;

/// Per-pair order id counter backed by an atomic store increment.
///
/// The first id is 1. Ids are never reused; an id drawn by a call that later
/// fails is simply skipped.
pub struct SequenceGenerator<S> {
    store: Arc<S>,
    key: String,
}

impl<S: Storage> SequenceGenerator<S> {
    pub fn new(store: Arc<S>, key: String) -> Self {
        Self { store, key }
    }

    pub async fn next_id(&self) -> StorageResult<OrderId> {
        self.store.incr(&self.key).await.map(OrderId::new)
    }

    /// Last id handed out, 0 before the first
    pub async fn current(&self) -> StorageResult<u64> {
        match self.store.get(&self.key).await? {
            None => Ok(0),
            Some(raw) => raw
                .parse()
                .map_err(|_| StorageError::corrupted(&self.key, format!("invalid counter {raw}"))),
        }
    }
}
