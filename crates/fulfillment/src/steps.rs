//! Order fulfillment saga step names, used in logs and failure diagnostics.

/// The saga type identifier for order fulfillment.
pub const SAGA_TYPE: &str = "OrderFulfillment";

/// Step name: Price the cart and check availability.
pub const STEP_BUILD_ORDER: &str = "build_order";

/// Step name: Validate and apply the coupon discount.
pub const STEP_APPLY_COUPON: &str = "apply_coupon";

/// Step name: Persist the pending order.
pub const STEP_PERSIST_ORDER: &str = "persist_order";

/// Step name: Charge the payment gateway.
pub const STEP_PROCESS_PAYMENT: &str = "process_payment";

/// Step name: Allocate stock across warehouses.
pub const STEP_ALLOCATE_STOCK: &str = "allocate_stock";

/// Step name: Commit coupon usage, confirm and complete the order.
pub const STEP_CONFIRM_ORDER: &str = "confirm_order";
