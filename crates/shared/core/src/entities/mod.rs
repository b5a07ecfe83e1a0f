mod order;
mod price_level;
mod side;
mod trade;

pub use order::{OrderRequest, RestingOrder};
pub use price_level::{DepthEntry, PriceLevel};
pub use side::Side;
pub use trade::Trade;
