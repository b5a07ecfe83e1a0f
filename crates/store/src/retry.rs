use async_trait::async_trait;
use log::{debug, warn};
use matchbook_ports::{
    BatchStore, CounterStore, HashStore, KeyValueStore, ListStore, ScoreOrder, ScoredMember,
    SortedSetStore, Storage, StorageError, StorageResult, WriteBatch,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

/// Timeout and backoff applied to every storage call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Per-attempt deadline
    pub timeout_ms: u64,
    /// Total attempts including the first; at least one is always made
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 250,
            max_attempts: 3,
            initial_backoff_ms: 10,
            max_backoff_ms: 200,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no backoff
    pub fn no_retry(timeout: Duration) -> Self {
        Self {
            timeout_ms: timeout.as_millis() as u64,
            max_attempts: 1,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay before retry number `attempt` (1-based), doubling each time
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        let millis = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Storage decorator bounding every call with a timeout and retrying
/// transient failures with exponential backoff.
///
/// Reads and overwrites are retried on any transient error. Writes that are
/// not idempotent (`incr`, `rpush`, `commit`) are only retried when the store
/// reported itself unavailable; after a timeout the write may have landed,
/// so the error is surfaced instead.
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: Storage> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn run<'a, T, F, Fut>(
        &'a self,
        op: &'static str,
        key: &str,
        idempotent: bool,
        mut call: F,
    ) -> StorageResult<T>
    where
        F: FnMut(&'a S) -> Fut,
        Fut: Future<Output = StorageResult<T>>,
    {
        let timeout = self.policy.timeout();
        let attempts = self.policy.attempts();
        let mut attempt = 1;

        loop {
            let result = match tokio::time::timeout(timeout, call(&self.inner)).await {
                Ok(result) => result,
                Err(_) => Err(StorageError::Timeout(timeout)),
            };

            let err = match result {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} {} succeeded on attempt {}", op, key, attempt);
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            let retryable = match &err {
                StorageError::Unavailable(_) => true,
                StorageError::Timeout(_) => idempotent,
                _ => false,
            };
            if !retryable || attempt >= attempts {
                return Err(err);
            }

            let delay = self.policy.backoff(attempt);
            warn!(
                "{} {} failed on attempt {}/{}: {}; retrying in {:?}",
                op, key, attempt, attempts, err, delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl<S: Storage> KeyValueStore for RetryingStore<S> {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.run("get", key, true, |s| s.get(key)).await
    }

    async fn set(&self, key: &str, value: String) -> StorageResult<()> {
        self.run("set", key, true, |s| s.set(key, value.clone()))
            .await
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        self.run("delete", key, true, |s| s.delete(key)).await
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.run("exists", key, true, |s| s.exists(key)).await
    }
}

#[async_trait]
impl<S: Storage> CounterStore for RetryingStore<S> {
    async fn incr(&self, key: &str) -> StorageResult<u64> {
        self.run("incr", key, false, |s| s.incr(key)).await
    }
}

#[async_trait]
impl<S: Storage> SortedSetStore for RetryingStore<S> {
    async fn zadd(&self, key: &str, member: &str, score: Decimal) -> StorageResult<bool> {
        self.run("zadd", key, true, |s| s.zadd(key, member, score))
            .await
    }

    async fn zrem(&self, key: &str, member: &str) -> StorageResult<bool> {
        self.run("zrem", key, true, |s| s.zrem(key, member)).await
    }

    async fn zrange(
        &self,
        key: &str,
        offset: usize,
        limit: Option<usize>,
        order: ScoreOrder,
    ) -> StorageResult<Vec<ScoredMember>> {
        self.run("zrange", key, true, |s| s.zrange(key, offset, limit, order))
            .await
    }

    async fn zcard(&self, key: &str) -> StorageResult<usize> {
        self.run("zcard", key, true, |s| s.zcard(key)).await
    }
}

#[async_trait]
impl<S: Storage> ListStore for RetryingStore<S> {
    async fn rpush(&self, key: &str, value: String) -> StorageResult<usize> {
        self.run("rpush", key, false, |s| s.rpush(key, value.clone()))
            .await
    }

    async fn lrem(&self, key: &str, value: &str) -> StorageResult<usize> {
        self.run("lrem", key, true, |s| s.lrem(key, value)).await
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> StorageResult<Vec<String>> {
        self.run("lrange", key, true, |s| s.lrange(key, start, stop))
            .await
    }

    async fn llen(&self, key: &str) -> StorageResult<usize> {
        self.run("llen", key, true, |s| s.llen(key)).await
    }
}

#[async_trait]
impl<S: Storage> HashStore for RetryingStore<S> {
    async fn hset(&self, key: &str, field: &str, value: String) -> StorageResult<()> {
        self.run("hset", key, true, |s| s.hset(key, field, value.clone()))
            .await
    }

    async fn hset_many(&self, key: &str, fields: Vec<(String, String)>) -> StorageResult<()> {
        self.run("hset_many", key, true, |s| s.hset_many(key, fields.clone()))
            .await
    }

    async fn hgetall(&self, key: &str) -> StorageResult<HashMap<String, String>> {
        self.run("hgetall", key, true, |s| s.hgetall(key)).await
    }
}

#[async_trait]
impl<S: Storage> BatchStore for RetryingStore<S> {
    async fn commit(&self, batch: WriteBatch) -> StorageResult<()> {
        let label = format!("{} ops", batch.len());
        self.run("commit", &label, false, |s| s.commit(batch.clone()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FaultyStore, InMemoryStore};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            timeout_ms: 50,
            max_attempts: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 4,
        }
    }

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let policy = RetryPolicy {
            timeout_ms: 100,
            max_attempts: 5,
            initial_backoff_ms: 10,
            max_backoff_ms: 50,
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(10));
        assert_eq!(policy.backoff(2), Duration::from_millis(20));
        assert_eq!(policy.backoff(3), Duration::from_millis(40));
        assert_eq!(policy.backoff(4), Duration::from_millis(50));
        assert_eq!(policy.backoff(40), Duration::from_millis(50));
    }

    #[test]
    fn test_policy_defaults_from_partial_json() {
        let policy: RetryPolicy = serde_json::from_str(r#"{"max_attempts": 7}"#).unwrap();
        assert_eq!(policy.max_attempts, 7);
        assert_eq!(policy.timeout_ms, RetryPolicy::default().timeout_ms);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let faulty = FaultyStore::new(InMemoryStore::new());
        faulty.fail_next(2);
        let store = RetryingStore::new(faulty, fast_policy());

        store.set("k", "v".into()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.inner().calls("set"), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let faulty = FaultyStore::new(InMemoryStore::new());
        faulty.fail_next(10);
        let store = RetryingStore::new(faulty, fast_policy());

        let err = store.incr("counter").await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
        assert_eq!(store.inner().calls("incr"), 3);
    }

    #[tokio::test]
    async fn test_logic_errors_are_not_retried() {
        let store = RetryingStore::new(FaultyStore::new(InMemoryStore::new()), fast_policy());
        store.rpush("list", "1".into()).await.unwrap();

        let err = store.hgetall("list").await.unwrap_err();
        assert!(matches!(err, StorageError::WrongType { .. }));
        assert_eq!(store.inner().calls("hgetall"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out() {
        let faulty = FaultyStore::new(InMemoryStore::new());
        faulty.set_latency(Duration::from_secs(1));
        let store = RetryingStore::new(faulty, fast_policy());

        let err = store.get("k").await.unwrap_err();
        assert_eq!(err, StorageError::Timeout(Duration::from_millis(50)));
        assert_eq!(store.inner().calls("get"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_increment_is_not_repeated() {
        let faulty = FaultyStore::new(InMemoryStore::new());
        faulty.set_latency(Duration::from_secs(1));
        let store = RetryingStore::new(faulty, fast_policy());

        let err = store.incr("counter").await.unwrap_err();
        assert!(matches!(err, StorageError::Timeout(_)));
        assert_eq!(store.inner().calls("incr"), 1);
    }
}
