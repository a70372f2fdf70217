//! Fulfillment error types.

use common::{OrderId, ProductId};
use domain::{CouponError, OrderError, RepositoryError, StockError};
use thiserror::Error;

/// Errors that can occur while placing or administering orders.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The caller could not be identified.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Malformed request, e.g. a zero quantity or an empty cart.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The caller may not read or change this order.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u64,
        available: u64,
    },

    /// The coupon cannot be used; the inner error carries the reason.
    #[error("Coupon invalid: {0}")]
    CouponInvalid(#[from] CouponError),

    /// The gateway answered and refused the charge.
    #[error("Payment declined for order {order_id}: {reason}")]
    PaymentDeclined { order_id: OrderId, reason: String },

    /// The gateway failed, timed out, or the caller cancelled.
    #[error("Payment system error for order {order_id}: {reason}")]
    PaymentSystemError { order_id: OrderId, reason: String },

    /// Payment succeeded but the order could not be fulfilled; side effects
    /// were compensated.
    #[error("Fulfillment failed for order {order_id}: {reason}")]
    FulfillmentFailed { order_id: OrderId, reason: String },

    #[error("Order error: {0}")]
    Order(OrderError),

    #[error("Inventory error: {0}")]
    Inventory(StockError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<OrderError> for FulfillmentError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::AmountOverflow => {
                Self::InvalidArgument("order amount exceeds the supported range".to_string())
            }
            other => Self::Order(other),
        }
    }
}

impl From<StockError> for FulfillmentError {
    fn from(err: StockError) -> Self {
        match err {
            StockError::InsufficientStock {
                product_id,
                requested,
                available,
            } => Self::InsufficientStock {
                product_id,
                requested,
                available,
            },
            StockError::InvalidQuantity { quantity } => {
                Self::InvalidArgument(format!("quantity must be greater than 0, got {quantity}"))
            }
            other => Self::Inventory(other),
        }
    }
}

impl FulfillmentError {
    /// Only gateway-level failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PaymentSystemError { .. })
    }

    /// Short label used for the `reason` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "authentication_required",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::ProductNotFound(_) => "product_not_found",
            Self::OrderNotFound(_) => "order_not_found",
            Self::AccessDenied(_) => "access_denied",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::CouponInvalid(_) => "coupon_invalid",
            Self::PaymentDeclined { .. } => "payment_declined",
            Self::PaymentSystemError { .. } => "payment_system_error",
            Self::FulfillmentFailed { .. } => "fulfillment_failed",
            Self::Order(_) => "order_error",
            Self::Inventory(_) => "inventory_error",
            Self::Repository(_) => "repository_error",
        }
    }
}

/// Convenience type alias for fulfillment results.
pub type Result<T> = std::result::Result<T, FulfillmentError>;

#[cfg(test)]
mod tests {
    use super::*;
    use common::WarehouseId;

    #[test]
    fn test_only_system_errors_are_retryable() {
        let system = FulfillmentError::PaymentSystemError {
            order_id: OrderId::new("ORD-1"),
            reason: "timeout".into(),
        };
        let declined = FulfillmentError::PaymentDeclined {
            order_id: OrderId::new("ORD-1"),
            reason: "card refused".into(),
        };
        assert!(system.is_retryable());
        assert!(!declined.is_retryable());
        assert!(!FulfillmentError::AuthenticationRequired.is_retryable());
    }

    #[test]
    fn test_stock_errors_map_to_business_errors() {
        let err: FulfillmentError = StockError::InsufficientStock {
            product_id: ProductId::new("P1"),
            requested: 10,
            available: 4,
        }
        .into();
        assert!(matches!(
            err,
            FulfillmentError::InsufficientStock {
                requested: 10,
                available: 4,
                ..
            }
        ));

        let err: FulfillmentError = StockError::InvalidQuantity { quantity: 0 }.into();
        assert!(matches!(err, FulfillmentError::InvalidArgument(_)));

        let err: FulfillmentError = StockError::RecordNotFound {
            product_id: ProductId::new("P1"),
            warehouse_id: WarehouseId::new("WH-001"),
        }
        .into();
        assert_eq!(err.kind(), "inventory_error");
    }

    #[test]
    fn test_amount_overflow_is_invalid_argument() {
        let err: FulfillmentError = OrderError::AmountOverflow.into();
        assert!(matches!(err, FulfillmentError::InvalidArgument(_)));

        let err: FulfillmentError = OrderError::NoItems.into();
        assert!(matches!(err, FulfillmentError::Order(OrderError::NoItems)));
    }

    #[test]
    fn test_coupon_reason_is_preserved() {
        let err: FulfillmentError = CouponError::Inactive {
            code: "SAVE10".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Coupon invalid: Coupon SAVE10 is inactive");
        assert_eq!(err.kind(), "coupon_invalid");
    }
}
