use matchbook_core::{OrderId, Price, Quantity, Side};
use std::time::Duration;
use thiserror::Error;

/// Failures of the backing store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Key {key} holds the wrong kind of value, expected {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("Corrupted record at {key}: {reason}")]
    Corrupted { key: String, reason: String },
}

impl StorageError {
    /// Connectivity failures that may succeed when retried with backoff
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Unavailable(_) | StorageError::Timeout(_))
    }

    pub fn corrupted(key: impl Into<String>, reason: impl Into<String>) -> Self {
        StorageError::Corrupted {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Errors surfaced by order book operations.
///
/// Validation errors are raised before any mutation. A `Storage` error from
/// `submit_order` means the caller cannot assume the order was or was not
/// applied, and must re-query the book before retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("Order quantity must be > 0, got {0}")]
    OrderQuantity(Quantity),

    #[error("Order price must be > 0, got {0}")]
    OrderPrice(Price),

    #[error("Order {order_id} not found on {side} side")]
    NotFound { side: Side, order_id: OrderId },

    #[error("Resting quantity at {side} {price} exceeds the representable range")]
    QuantityOverflow { side: Side, price: Price },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl BookError {
    /// Only transient storage failures are worth retrying; logic errors are
    /// returned to the caller verbatim.
    pub fn is_retryable(&self) -> bool {
        match self {
            BookError::Storage(err) => err.is_transient(),
            _ => false,
        }
    }
}

pub type BookResult<T> = std::result::Result<T, BookError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_only_transient_storage_errors_are_retryable() {
        assert!(BookError::from(StorageError::Unavailable("down".into())).is_retryable());
        assert!(BookError::from(StorageError::Timeout(Duration::from_millis(5))).is_retryable());
        assert!(!BookError::from(StorageError::corrupted("quote-1", "bad qty")).is_retryable());
        assert!(!BookError::OrderQuantity(Quantity::from(dec!(0))).is_retryable());
        assert!(!BookError::OrderPrice(Price::ZERO).is_retryable());
        assert!(
            !BookError::NotFound {
                side: Side::Bid,
                order_id: OrderId::new(3)
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = BookError::NotFound {
            side: Side::Ask,
            order_id: OrderId::new(42),
        };
        assert_eq!(err.to_string(), "Order 42 not found on ask side");
    }
}
