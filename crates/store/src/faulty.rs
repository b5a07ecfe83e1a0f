use async_trait::async_trait;
use log::debug;
use matchbook_ports::{
    BatchStore, CounterStore, HashStore, KeyValueStore, ListStore, ScoreOrder, ScoredMember,
    SortedSetStore, Storage, StorageError, StorageResult, WriteBatch,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Default)]
struct Faults {
    fail_any: usize,
    fail_op: HashMap<&'static str, usize>,
    latency: Option<Duration>,
    calls: HashMap<&'static str, usize>,
}

/// Storage decorator that injects outages and latency.
///
/// Used by tests to exercise the failure paths of the order book and the
/// retry layer. Injected failures surface as `StorageError::Unavailable`.
pub struct FaultyStore<S> {
    inner: S,
    faults: Mutex<Faults>,
}

impl<S: Storage> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            faults: Mutex::new(Faults::default()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Fail the next `n` calls, whatever the operation
    pub fn fail_next(&self, n: usize) {
        self.faults.lock().fail_any = n;
    }

    /// Fail the next `n` calls of operation `op` (e.g. "commit", "incr")
    pub fn fail_op(&self, op: &'static str, n: usize) {
        self.faults.lock().fail_op.insert(op, n);
    }

    /// Delay every call by `latency`
    pub fn set_latency(&self, latency: Duration) {
        self.faults.lock().latency = Some(latency);
    }

    /// Clear all pending failures and latency
    pub fn heal(&self) {
        let mut faults = self.faults.lock();
        faults.fail_any = 0;
        faults.fail_op.clear();
        faults.latency = None;
    }

    /// Number of times `op` has been attempted
    pub fn calls(&self, op: &str) -> usize {
        self.faults.lock().calls.get(op).copied().unwrap_or(0)
    }

    async fn enter(&self, op: &'static str) -> StorageResult<()> {
        let latency = {
            let mut faults = self.faults.lock();
            *faults.calls.entry(op).or_default() += 1;
            faults.latency
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut faults = self.faults.lock();
        let injected = if faults.fail_any > 0 {
            faults.fail_any -= 1;
            true
        } else {
            match faults.fail_op.get_mut(op) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            }
        };
        if injected {
            debug!("Injecting failure into {}", op);
            return Err(StorageError::Unavailable(format!("injected failure in {op}")));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: Storage> KeyValueStore for FaultyStore<S> {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.enter("get").await?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> StorageResult<()> {
        self.enter("set").await?;
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        self.enter("delete").await?;
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.enter("exists").await?;
        self.inner.exists(key).await
    }
}

#[async_trait]
impl<S: Storage> CounterStore for FaultyStore<S> {
    async fn incr(&self, key: &str) -> StorageResult<u64> {
        self.enter("incr").await?;
        self.inner.incr(key).await
    }
}

#[async_trait]
impl<S: Storage> SortedSetStore for FaultyStore<S> {
    async fn zadd(&self, key: &str, member: &str, score: Decimal) -> StorageResult<bool> {
        self.enter("zadd").await?;
        self.inner.zadd(key, member, score).await
    }

    async fn zrem(&self, key: &str, member: &str) -> StorageResult<bool> {
        self.enter("zrem").await?;
        self.inner.zrem(key, member).await
    }

    async fn zrange(
        &self,
        key: &str,
        offset: usize,
        limit: Option<usize>,
        order: ScoreOrder,
    ) -> StorageResult<Vec<ScoredMember>> {
        self.enter("zrange").await?;
        self.inner.zrange(key, offset, limit, order).await
    }

    async fn zcard(&self, key: &str) -> StorageResult<usize> {
        self.enter("zcard").await?;
        self.inner.zcard(key).await
    }
}

#[async_trait]
impl<S: Storage> ListStore for FaultyStore<S> {
    async fn rpush(&self, key: &str, value: String) -> StorageResult<usize> {
        self.enter("rpush").await?;
        self.inner.rpush(key, value).await
    }

    async fn lrem(&self, key: &str, value: &str) -> StorageResult<usize> {
        self.enter("lrem").await?;
        self.inner.lrem(key, value).await
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> StorageResult<Vec<String>> {
        self.enter("lrange").await?;
        self.inner.lrange(key, start, stop).await
    }

    async fn llen(&self, key: &str) -> StorageResult<usize> {
        self.enter("llen").await?;
        self.inner.llen(key).await
    }
}

#[async_trait]
impl<S: Storage> HashStore for FaultyStore<S> {
    async fn hset(&self, key: &str, field: &str, value: String) -> StorageResult<()> {
        self.enter("hset").await?;
        self.inner.hset(key, field, value).await
    }

    async fn hset_many(&self, key: &str, fields: Vec<(String, String)>) -> StorageResult<()> {
        self.enter("hset_many").await?;
        self.inner.hset_many(key, fields).await
    }

    async fn hgetall(&self, key: &str) -> StorageResult<HashMap<String, String>> {
        self.enter("hgetall").await?;
        self.inner.hgetall(key).await
    }
}

#[async_trait]
impl<S: Storage> BatchStore for FaultyStore<S> {
    async fn commit(&self, batch: WriteBatch) -> StorageResult<()> {
        self.enter("commit").await?;
        self.inner.commit(batch).await
    }
}
