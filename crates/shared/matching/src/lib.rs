//! Matchbook Matching Engine
//!
//! Price-time priority limit order book over an abstract backing store.
//!
//! - [`PriceIndex`]: one per side, price levels holding FIFO queues of order ids
//! - [`OrderStore`]: hash records of resting orders
//! - [`SequenceGenerator`]: per-pair order id counter
//! - [`TradeTape`]: append-only trade record
//! - [`OrderBook`]: the matching engine tying them together
//!
//! Trades always execute at the resting (maker) order's price.

mod book;
mod codec;
mod keys;
mod order_store;
mod price_index;
mod sequence;
mod tape;

pub use book::{OrderBook, SubmitResult};
pub use keys::BookKeys;
pub use order_store::OrderStore;
pub use price_index::PriceIndex;
pub use sequence::SequenceGenerator;
pub use tape::TradeTape;

// Re-export the error types for convenience
pub use matchbook_ports::{BookError, BookResult};
