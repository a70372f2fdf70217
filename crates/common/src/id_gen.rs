//! Injected identifier generation.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::types::OrderId;

/// Source of new order identifiers.
pub trait IdGenerator: Send + Sync {
    /// Returns a fresh, unique order id.
    fn next_order_id(&self) -> OrderId;
}

/// Random UUID-based ids (`ORD-<uuid>`), used in production wiring.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl UuidIdGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl IdGenerator for UuidIdGenerator {
    fn next_order_id(&self) -> OrderId {
        OrderId::new(format!("ORD-{}", Uuid::new_v4().simple()))
    }
}

/// Deterministic ids (`ORD-0001`, `ORD-0002`, ...) for tests and demos.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    /// Creates a generator whose first id is `ORD-0001`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_order_id(&self) -> OrderId {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        OrderId::new(format!("ORD-{n:04}"))
    }
}
