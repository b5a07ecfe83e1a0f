mod ids;
mod pair;
mod price;
mod quantity;

use chrono::{DateTime, Utc};

pub use ids::OrderId;
pub use pair::TradingPair;
pub use price::Price;
pub use quantity::Quantity;

/// Timestamp in UTC, nanosecond resolution
pub type Timestamp = DateTime<Utc>;

/// Opaque trader identifier supplied by the caller
pub type TraderId = String;
