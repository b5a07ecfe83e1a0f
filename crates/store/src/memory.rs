use async_trait::async_trait;
use matchbook_ports::{
    BatchStore, CounterStore, HashStore, KeyValueStore, ListStore, ScoreOrder, ScoredMember,
    SortedSetStore, StorageError, StorageResult, WriteBatch, WriteOp,
};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// In-memory backing store
///
/// Thread-safe, redis-like keyspace. Each key holds one kind of value;
/// using a key as the wrong kind fails with `StorageError::WrongType`.
/// Empty lists, sets and hashes are dropped, as redis does.
/// Suitable for simulation and testing.
#[derive(Default)]
pub struct InMemoryStore {
    keyspace: RwLock<Keyspace>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All live keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.keyspace.read().entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.keyspace.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyspace.read().entries.is_empty()
    }
}

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    SortedSet(SortedSet),
    List(VecDeque<String>),
    Hash(HashMap<String, String>),
}

#[derive(Debug, Clone, Default)]
struct SortedSet {
    scores: HashMap<String, Decimal>,
    ranked: BTreeSet<(Decimal, String)>,
}

impl SortedSet {
    fn insert(&mut self, member: &str, score: Decimal) -> bool {
        let added = match self.scores.insert(member.to_string(), score) {
            Some(old) => {
                self.ranked.remove(&(old, member.to_string()));
                false
            }
            None => true,
        };
        self.ranked.insert((score, member.to_string()));
        added
    }

    fn remove(&mut self, member: &str) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.ranked.remove(&(score, member.to_string()));
                true
            }
            None => false,
        }
    }

    fn range(&self, offset: usize, limit: Option<usize>, order: ScoreOrder) -> Vec<ScoredMember> {
        let limit = limit.unwrap_or(usize::MAX);
        let to_member = |(score, member): &(Decimal, String)| ScoredMember {
            member: member.clone(),
            score: *score,
        };
        match order {
            ScoreOrder::Ascending => self
                .ranked
                .iter()
                .skip(offset)
                .take(limit)
                .map(to_member)
                .collect(),
            ScoreOrder::Descending => self
                .ranked
                .iter()
                .rev()
                .skip(offset)
                .take(limit)
                .map(to_member)
                .collect(),
        }
    }
}

#[derive(Debug, Default)]
struct Keyspace {
    entries: HashMap<String, Value>,
}

fn wrong_type(key: &str, expected: &'static str) -> StorageError {
    StorageError::WrongType {
        key: key.to_string(),
        expected,
    }
}

impl Keyspace {
    fn string(&self, key: &str) -> StorageResult<Option<&String>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Value::Str(s)) => Ok(Some(s)),
            Some(_) => Err(wrong_type(key, "string")),
        }
    }

    fn sorted_set(&self, key: &str) -> StorageResult<Option<&SortedSet>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Value::SortedSet(z)) => Ok(Some(z)),
            Some(_) => Err(wrong_type(key, "sorted set")),
        }
    }

    fn list(&self, key: &str) -> StorageResult<Option<&VecDeque<String>>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Value::List(l)) => Ok(Some(l)),
            Some(_) => Err(wrong_type(key, "list")),
        }
    }

    fn hash(&self, key: &str) -> StorageResult<Option<&HashMap<String, String>>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Value::Hash(h)) => Ok(Some(h)),
            Some(_) => Err(wrong_type(key, "hash")),
        }
    }

    fn set(&mut self, key: &str, value: String) -> StorageResult<()> {
        match self.entries.get(key) {
            None | Some(Value::Str(_)) => {
                self.entries.insert(key.to_string(), Value::Str(value));
                Ok(())
            }
            Some(_) => Err(wrong_type(key, "string")),
        }
    }

    fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    fn incr(&mut self, key: &str) -> StorageResult<u64> {
        let current = match self.string(key)? {
            None => 0,
            Some(s) => s
                .parse::<u64>()
                .map_err(|_| StorageError::corrupted(key, "counter is not an integer"))?,
        };
        let next = current + 1;
        self.entries
            .insert(key.to_string(), Value::Str(next.to_string()));
        Ok(next)
    }

    fn zadd(&mut self, key: &str, member: &str, score: Decimal) -> StorageResult<bool> {
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Value::SortedSet(SortedSet::default()));
        match entry {
            Value::SortedSet(z) => Ok(z.insert(member, score)),
            _ => Err(wrong_type(key, "sorted set")),
        }
    }

    fn zrem(&mut self, key: &str, member: &str) -> StorageResult<bool> {
        let removed = match self.entries.get_mut(key) {
            None => return Ok(false),
            Some(Value::SortedSet(z)) => {
                let removed = z.remove(member);
                if z.scores.is_empty() {
                    self.entries.remove(key);
                }
                removed
            }
            Some(_) => return Err(wrong_type(key, "sorted set")),
        };
        Ok(removed)
    }

    fn rpush(&mut self, key: &str, value: String) -> StorageResult<usize> {
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Value::List(VecDeque::new()));
        match entry {
            Value::List(l) => {
                l.push_back(value);
                Ok(l.len())
            }
            _ => Err(wrong_type(key, "list")),
        }
    }

    fn lrem(&mut self, key: &str, value: &str) -> StorageResult<usize> {
        let removed = match self.entries.get_mut(key) {
            None => return Ok(0),
            Some(Value::List(l)) => {
                let before = l.len();
                l.retain(|v| v != value);
                let removed = before - l.len();
                if l.is_empty() {
                    self.entries.remove(key);
                }
                removed
            }
            Some(_) => return Err(wrong_type(key, "list")),
        };
        Ok(removed)
    }

    fn hset_many(&mut self, key: &str, fields: Vec<(String, String)>) -> StorageResult<()> {
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(HashMap::new()));
        match entry {
            Value::Hash(h) => {
                h.extend(fields);
                Ok(())
            }
            _ => Err(wrong_type(key, "hash")),
        }
    }

    fn apply(&mut self, op: WriteOp) -> StorageResult<()> {
        match op {
            WriteOp::Set { key, value } => self.set(&key, value),
            WriteOp::Delete { key } => {
                self.delete(&key);
                Ok(())
            }
            WriteOp::ZAdd { key, member, score } => self.zadd(&key, &member, score).map(|_| ()),
            WriteOp::ZRem { key, member } => self.zrem(&key, &member).map(|_| ()),
            WriteOp::RPush { key, value } => self.rpush(&key, value).map(|_| ()),
            WriteOp::LRem { key, value } => self.lrem(&key, &value).map(|_| ()),
            WriteOp::HSetMany { key, fields } => self.hset_many(&key, fields),
        }
    }

    /// Apply all ops or none. Every key is snapshotted before its first
    /// write so a failing op can restore the touched keys.
    fn apply_atomically(&mut self, ops: Vec<WriteOp>) -> StorageResult<()> {
        let mut undo: HashMap<String, Option<Value>> = HashMap::new();

        for op in ops {
            if !undo.contains_key(op.key()) {
                undo.insert(op.key().to_string(), self.entries.get(op.key()).cloned());
            }
            if let Err(err) = self.apply(op) {
                for (key, previous) in undo {
                    match previous {
                        Some(value) => self.entries.insert(key, value),
                        None => self.entries.remove(&key),
                    };
                }
                return Err(err);
            }
        }
        Ok(())
    }
}

/// Resolve a redis-style inclusive range against a list of `len` items
fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.keyspace.read().string(key)?.cloned())
    }

    async fn set(&self, key: &str, value: String) -> StorageResult<()> {
        self.keyspace.write().set(key, value)
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        Ok(self.keyspace.write().delete(key))
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.keyspace.read().entries.contains_key(key))
    }
}

#[async_trait]
impl CounterStore for InMemoryStore {
    async fn incr(&self, key: &str) -> StorageResult<u64> {
        self.keyspace.write().incr(key)
    }
}

#[async_trait]
impl SortedSetStore for InMemoryStore {
    async fn zadd(&self, key: &str, member: &str, score: Decimal) -> StorageResult<bool> {
        self.keyspace.write().zadd(key, member, score)
    }

    async fn zrem(&self, key: &str, member: &str) -> StorageResult<bool> {
        self.keyspace.write().zrem(key, member)
    }

    async fn zrange(
        &self,
        key: &str,
        offset: usize,
        limit: Option<usize>,
        order: ScoreOrder,
    ) -> StorageResult<Vec<ScoredMember>> {
        let keyspace = self.keyspace.read();
        Ok(keyspace
            .sorted_set(key)?
            .map(|z| z.range(offset, limit, order))
            .unwrap_or_default())
    }

    async fn zcard(&self, key: &str) -> StorageResult<usize> {
        Ok(self
            .keyspace
            .read()
            .sorted_set(key)?
            .map_or(0, |z| z.scores.len()))
    }
}

#[async_trait]
impl ListStore for InMemoryStore {
    async fn rpush(&self, key: &str, value: String) -> StorageResult<usize> {
        self.keyspace.write().rpush(key, value)
    }

    async fn lrem(&self, key: &str, value: &str) -> StorageResult<usize> {
        self.keyspace.write().lrem(key, value)
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> StorageResult<Vec<String>> {
        let keyspace = self.keyspace.read();
        let Some(list) = keyspace.list(key)? else {
            return Ok(Vec::new());
        };
        Ok(match resolve_range(list.len(), start, stop) {
            Some((from, to)) => list.range(from..=to).cloned().collect(),
            None => Vec::new(),
        })
    }

    async fn llen(&self, key: &str) -> StorageResult<usize> {
        Ok(self.keyspace.read().list(key)?.map_or(0, VecDeque::len))
    }
}

#[async_trait]
impl HashStore for InMemoryStore {
    async fn hset(&self, key: &str, field: &str, value: String) -> StorageResult<()> {
        self.keyspace
            .write()
            .hset_many(key, vec![(field.to_string(), value)])
    }

    async fn hset_many(&self, key: &str, fields: Vec<(String, String)>) -> StorageResult<()> {
        self.keyspace.write().hset_many(key, fields)
    }

    async fn hgetall(&self, key: &str) -> StorageResult<HashMap<String, String>> {
        Ok(self.keyspace.read().hash(key)?.cloned().unwrap_or_default())
    }
}

#[async_trait]
impl BatchStore for InMemoryStore {
    async fn commit(&self, batch: WriteBatch) -> StorageResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.keyspace.write().apply_atomically(batch.into_ops())
    }
}
