//! External collaborators of the fulfillment saga.

pub mod identity;
pub mod payment;

pub use identity::{IdentityError, IdentityProvider, InMemoryIdentityProvider, RequestContext};
pub use payment::{
    InMemoryPaymentGateway, PaymentError, PaymentGateway, PaymentMode, PaymentOutcome,
    PaymentRequest, SimulatedPaymentConfig, SimulatedPaymentGateway,
};
