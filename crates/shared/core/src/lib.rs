//! Matchbook Core Domain
//!
//! Pure domain types for the matchbook limit order book.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{DepthEntry, OrderRequest, PriceLevel, RestingOrder, Side, Trade};
pub use values::{OrderId, Price, Quantity, Timestamp, TraderId, TradingPair};
