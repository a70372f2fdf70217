//! Order state machine.

use serde::{Deserialize, Serialize};

/// The state of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──► Confirmed ──► Completed ──► Delivered
///    │            │
///    └────────────┴──► PaymentFailed
///
/// any state except Delivered/Cancelled ──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order is being built; items and coupon can change.
    #[default]
    Pending,

    /// Payment succeeded and stock is allocated.
    Confirmed,

    /// Fulfillment finished.
    Completed,

    /// Payment or allocation failed; all side effects were compensated.
    PaymentFailed,

    /// Cancelled by an administrator (terminal state).
    Cancelled,

    /// Handed to the customer (terminal state).
    Delivered,
}

impl OrderStatus {
    /// Returns true if items or the coupon can be changed in this state.
    pub fn can_modify(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    pub fn can_confirm(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    pub fn can_fail_payment(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    pub fn can_complete(&self) -> bool {
        matches!(self, OrderStatus::Confirmed)
    }

    pub fn can_cancel(&self) -> bool {
        !matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn can_deliver(&self) -> bool {
        matches!(self, OrderStatus::Completed)
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns true once the order has been paid for and shipped from stock.
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Delivered)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Completed => "completed",
            OrderStatus::PaymentFailed => "payment_failed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Delivered => "delivered",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
