//! Payment gateway port, a simulated gateway and a scripted test double.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{Clock, OrderId, SystemClock, UserId};
use domain::Money;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// A charge request sent to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub amount: Money,
}

/// The gateway's answer to a charge it processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Approved { transaction_id: String },
    Declined { reason: String },
}

/// The gateway could not produce an answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("payment cancelled")]
    Cancelled,

    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),
}

/// External payment gateway.
///
/// A decline is a normal outcome; `Err` is reserved for failures where the
/// gateway never answered.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn process_payment(
        &self,
        request: &PaymentRequest,
        cancel: &CancellationToken,
    ) -> Result<PaymentOutcome, PaymentError>;
}

// -- Simulated gateway --

/// Settings for [`SimulatedPaymentGateway`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedPaymentConfig {
    /// Probability in `0.0..=1.0` that a charge is approved.
    pub success_rate: f64,
    pub min_latency: Duration,
    pub max_latency: Duration,
}

impl Default for SimulatedPaymentConfig {
    fn default() -> Self {
        Self {
            success_rate: 0.9,
            min_latency: Duration::from_millis(50),
            max_latency: Duration::from_millis(500),
        }
    }
}

struct SimulatedState {
    rng: StdRng,
    success_rate: f64,
}

/// Gateway with random latency and a configurable approval rate.
///
/// All randomness comes from one injected `StdRng`, so a seeded gateway
/// produces the same sequence of outcomes on every run.
#[derive(Clone)]
pub struct SimulatedPaymentGateway {
    state: Arc<Mutex<SimulatedState>>,
    min_latency: Duration,
    max_latency: Duration,
    clock: Arc<dyn Clock>,
}

impl SimulatedPaymentGateway {
    pub fn new(config: SimulatedPaymentConfig, rng: StdRng) -> Self {
        Self::with_clock(config, rng, Arc::new(SystemClock))
    }

    pub fn seeded(config: SimulatedPaymentConfig, seed: u64) -> Self {
        Self::new(config, StdRng::seed_from_u64(seed))
    }

    /// Seeds from the operating system; outcomes differ between runs.
    pub fn from_os_rng(config: SimulatedPaymentConfig) -> Self {
        Self::new(config, StdRng::from_os_rng())
    }

    pub fn with_clock(config: SimulatedPaymentConfig, rng: StdRng, clock: Arc<dyn Clock>) -> Self {
        let (min_latency, max_latency) = if config.min_latency <= config.max_latency {
            (config.min_latency, config.max_latency)
        } else {
            (config.max_latency, config.min_latency)
        };

        Self {
            state: Arc::new(Mutex::new(SimulatedState {
                rng,
                success_rate: config.success_rate.clamp(0.0, 1.0),
            })),
            min_latency,
            max_latency,
            clock,
        }
    }

    /// Changes the approval probability, clamped to `0.0..=1.0`.
    pub async fn set_success_rate(&self, rate: f64) {
        let rate = rate.clamp(0.0, 1.0);
        self.state.lock().await.success_rate = rate;
        tracing::info!(success_rate = rate, "Payment success rate updated");
    }

    pub async fn success_rate(&self) -> f64 {
        self.state.lock().await.success_rate
    }

    async fn draw(&self) -> (Duration, bool) {
        let mut state = self.state.lock().await;
        let min = self.min_latency.as_millis() as u64;
        let max = self.max_latency.as_millis() as u64;
        let latency = Duration::from_millis(state.rng.random_range(min..=max));
        let approved = state.rng.random::<f64>() < state.success_rate;
        (latency, approved)
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    #[tracing::instrument(skip(self, cancel), fields(order_id = %request.order_id, amount = %request.amount))]
    async fn process_payment(
        &self,
        request: &PaymentRequest,
        cancel: &CancellationToken,
    ) -> Result<PaymentOutcome, PaymentError> {
        let (latency, approved) = self.draw().await;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PaymentError::Cancelled),
            _ = tokio::time::sleep(latency) => {}
        }

        if approved {
            let transaction_id = format!(
                "TXN-{}-{}",
                self.clock.now().timestamp(),
                request.order_id
            );
            tracing::debug!(%transaction_id, "Payment approved");
            Ok(PaymentOutcome::Approved { transaction_id })
        } else {
            tracing::debug!("Payment declined");
            Ok(PaymentOutcome::Declined {
                reason: "payment declined by issuer".to_string(),
            })
        }
    }
}

// -- Scripted gateway --

/// Behaviour of [`InMemoryPaymentGateway`] for the next charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentMode {
    #[default]
    Approve,
    Decline,
    /// Fail with [`PaymentError::Unavailable`].
    Fail,
    /// Never answer; only cancellation ends the call.
    Hang,
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    mode: PaymentMode,
    charges: Vec<PaymentRequest>,
    next_id: u32,
}

/// Scripted gateway for tests. Records every charge it answers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<Mutex<InMemoryPaymentState>>,
}

impl InMemoryPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: PaymentMode) -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryPaymentState {
                mode,
                ..Default::default()
            })),
        }
    }

    pub async fn set_mode(&self, mode: PaymentMode) {
        self.state.lock().await.mode = mode;
    }

    /// Requests the gateway accepted for processing, in call order.
    pub async fn charges(&self) -> Vec<PaymentRequest> {
        self.state.lock().await.charges.clone()
    }

    pub async fn charge_count(&self) -> usize {
        self.state.lock().await.charges.len()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn process_payment(
        &self,
        request: &PaymentRequest,
        cancel: &CancellationToken,
    ) -> Result<PaymentOutcome, PaymentError> {
        let mode = {
            let mut state = self.state.lock().await;
            state.charges.push(request.clone());
            state.mode
        };

        match mode {
            PaymentMode::Approve => {
                let mut state = self.state.lock().await;
                state.next_id += 1;
                Ok(PaymentOutcome::Approved {
                    transaction_id: format!("TXN-{:04}", state.next_id),
                })
            }
            PaymentMode::Decline => Ok(PaymentOutcome::Declined {
                reason: "card declined".to_string(),
            }),
            PaymentMode::Fail => Err(PaymentError::Unavailable(
                "gateway connection refused".to_string(),
            )),
            PaymentMode::Hang => {
                cancel.cancelled().await;
                Err(PaymentError::Cancelled)
            }
        }
    }
}
