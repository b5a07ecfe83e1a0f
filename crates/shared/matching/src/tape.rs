use matchbook_core::Trade;
use matchbook_ports::{Storage, StorageResult, WriteBatch};
use std::sync::Arc;

use crate::codec;

/// Append-only record of trades in execution order
pub struct TradeTape<S> {
    store: Arc<S>,
    key: String,
}

impl<S: Storage> TradeTape<S> {
    pub fn new(store: Arc<S>, key: String) -> Self {
        Self { store, key }
    }

    pub async fn append(&self, trade: &Trade) -> StorageResult<()> {
        let mut batch = WriteBatch::new();
        self.stage_append(&mut batch, trade)?;
        self.store.commit(batch).await
    }

    pub(crate) fn stage_append(&self, batch: &mut WriteBatch, trade: &Trade) -> StorageResult<()> {
        batch.rpush(self.key.clone(), codec::encode_trade(&self.key, trade)?);
        Ok(())
    }

    /// The last `n` trades, oldest first
    pub async fn recent(&self, n: usize) -> StorageResult<Vec<Trade>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let start = -(n.min(isize::MAX as usize) as isize);
        self.store
            .lrange(&self.key, start, -1)
            .await?
            .iter()
            .map(|raw| codec::decode_trade(&self.key, raw))
            .collect()
    }

    pub async fn len(&self) -> StorageResult<usize> {
        self.store.llen(&self.key).await
    }
}
