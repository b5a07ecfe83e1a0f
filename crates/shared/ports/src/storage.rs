use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::batch::WriteBatch;
use crate::error::StorageResult;

/// Direction of a sorted-set range enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOrder {
    Ascending,
    Descending,
}

/// A sorted-set member with its score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredMember {
    pub member: String,
    pub score: Decimal,
}

/// Atomic operations on single string keys
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    async fn set(&self, key: &str, value: String) -> StorageResult<()>;

    /// Delete a key of any kind; returns whether it existed
    async fn delete(&self, key: &str) -> StorageResult<bool>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;
}

/// Atomic counters
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increment and return the new value; an absent counter starts at 0
    async fn incr(&self, key: &str) -> StorageResult<u64>;
}

/// Ordered sets of unique members ranked by score
#[async_trait]
pub trait SortedSetStore: Send + Sync {
    /// Add or re-score a member; returns true if it was newly added
    async fn zadd(&self, key: &str, member: &str, score: Decimal) -> StorageResult<bool>;

    /// Remove a member; returns whether it was present
    async fn zrem(&self, key: &str, member: &str) -> StorageResult<bool>;

    /// Enumerate members in score order, skipping `offset` and returning at
    /// most `limit` (all remaining when `None`)
    async fn zrange(
        &self,
        key: &str,
        offset: usize,
        limit: Option<usize>,
        order: ScoreOrder,
    ) -> StorageResult<Vec<ScoredMember>>;

    async fn zcard(&self, key: &str) -> StorageResult<usize>;
}

/// Lists of string values
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Append at the tail; returns the new length
    async fn rpush(&self, key: &str, value: String) -> StorageResult<usize>;

    /// Remove every occurrence of `value`; returns how many were removed.
    /// A list left empty ceases to exist.
    async fn lrem(&self, key: &str, value: &str) -> StorageResult<usize>;

    /// Inclusive range with redis index semantics: negative indexes count
    /// from the tail, so `lrange(key, 0, -1)` reads the whole list.
    async fn lrange(&self, key: &str, start: isize, stop: isize) -> StorageResult<Vec<String>>;

    async fn llen(&self, key: &str) -> StorageResult<usize>;
}

/// Records made of named string fields
#[async_trait]
pub trait HashStore: Send + Sync {
    async fn hset(&self, key: &str, field: &str, value: String) -> StorageResult<()>;

    async fn hset_many(&self, key: &str, fields: Vec<(String, String)>) -> StorageResult<()>;

    /// All fields of a record; empty when the record does not exist
    async fn hgetall(&self, key: &str) -> StorageResult<HashMap<String, String>>;
}

/// Transactional application of several writes
#[async_trait]
pub trait BatchStore: Send + Sync {
    /// Apply every operation of `batch` atomically: either all of them take
    /// effect or, on error, none do.
    async fn commit(&self, batch: WriteBatch) -> StorageResult<()>;
}

/// The full set of primitives the order book needs from its backing store
pub trait Storage:
    KeyValueStore + CounterStore + SortedSetStore + ListStore + HashStore + BatchStore
{
}

impl<T> Storage for T where
    T: KeyValueStore + CounterStore + SortedSetStore + ListStore + HashStore + BatchStore
{
}
