//! Matchbook Ports
//!
//! Port definitions (traits) for the matchbook order book.
//! These define the boundaries between the matching engine and its
//! infrastructure: the time source and the backing store.

mod batch;
mod clock;
mod error;
mod storage;

pub use batch::{WriteBatch, WriteOp};
pub use clock::Clock;
pub use error::{BookError, BookResult, StorageError, StorageResult};
pub use storage::{
    BatchStore, CounterStore, HashStore, KeyValueStore, ListStore, ScoreOrder, ScoredMember,
    SortedSetStore, Storage,
};
