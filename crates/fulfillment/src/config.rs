//! Orchestrator settings.

use std::time::Duration;

/// Settings for [`FulfillmentOrchestrator`](crate::FulfillmentOrchestrator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FulfillmentConfig {
    /// Upper bound on a single gateway call. Exceeding it is a payment
    /// system error.
    pub payment_timeout: Duration,
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            payment_timeout: Duration::from_secs(5),
        }
    }
}
