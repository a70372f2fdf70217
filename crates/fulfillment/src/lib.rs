//! Order fulfillment saga.
//!
//! This crate orchestrates order placement across the domain services with
//! compensating actions on failure:
//! 1. Build and price the order, checking availability (no side effects)
//! 2. Validate and apply the coupon
//! 3. Persist the pending order
//! 4. Charge the payment gateway
//! 5. Allocate stock across warehouses
//! 6. Commit coupon usage, confirm and complete the order
//!
//! If anything fails after payment, allocations are restored, coupon usage
//! is rolled back and the order is left in `payment_failed`.

pub mod compensation;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod request;
pub mod services;
pub mod steps;

pub use compensation::CompensationLog;
pub use config::FulfillmentConfig;
pub use error::FulfillmentError;
pub use orchestrator::FulfillmentOrchestrator;
pub use request::{OrderLine, PlaceOrderRequest};
pub use services::{
    IdentityError, IdentityProvider, InMemoryIdentityProvider, InMemoryPaymentGateway,
    PaymentError, PaymentGateway, PaymentMode, PaymentOutcome, PaymentRequest, RequestContext,
    SimulatedPaymentConfig, SimulatedPaymentGateway,
};
