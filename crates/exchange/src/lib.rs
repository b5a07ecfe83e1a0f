//! Matchbook Exchange
//!
//! Caller-facing boundary of the order book: an [`Exchange`] registry that
//! opens one book per trading pair over a shared backing store, and
//! [`BookHandle`]s that serialize every call on a pair.
//!
//! ```ignore
//! use matchbook_exchange::{Exchange, ExchangeConfig};
//! use matchbook_clock::SystemClock;
//! use matchbook_store::InMemoryStore;
//!
//! let config = ExchangeConfig::from_file("matchbook.json")?;
//! let exchange = Exchange::from_config(InMemoryStore::new(), SystemClock::new(), &config)?;
//! let book = exchange.book("BTC", "USDT").unwrap();
//! let result = book.submit_order(OrderRequest::bid(dec!(1), dec!(960), "alice")).await?;
//! ```

pub mod config;
pub mod error;
mod exchange;
mod handle;

pub use config::{ConfigError, ExchangeConfig, MarketConfig};
pub use error::{ExchangeError, Result};
pub use exchange::Exchange;
pub use handle::BookHandle;

// Re-export the types callers need to drive a book
pub use matchbook_core::{OrderId, OrderRequest, Price, Quantity, Side, Trade};
pub use matchbook_matching::SubmitResult;
pub use matchbook_ports::{BookError, BookResult};
pub use matchbook_store::RetryPolicy;
