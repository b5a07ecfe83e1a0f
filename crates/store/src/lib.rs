//! Matchbook Storage Adapters
//!
//! Implementations of the storage ports defined in `matchbook-ports`:
//!
//! - [`InMemoryStore`]: redis-like typed keyspace (strings, counters, sorted
//!   sets, lists, hashes) with atomic write batches
//! - [`RetryingStore`]: decorator applying a bounded timeout and exponential
//!   backoff to transient failures of any store
//! - [`FaultyStore`]: decorator injecting failures and latency, for tests

mod faulty;
mod memory;
mod retry;

pub use faulty::FaultyStore;
pub use memory::InMemoryStore;
pub use retry::{RetryPolicy, RetryingStore};
