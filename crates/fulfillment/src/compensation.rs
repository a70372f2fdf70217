//! Record of side effects a saga run has committed.

use common::ProductId;
use domain::StockAllocation;

/// What must be undone if the run fails after payment.
///
/// Allocations are kept per order line in the order they were made; the
/// coupon code is recorded only once its usage has been committed.
#[derive(Debug, Default)]
pub struct CompensationLog {
    allocations: Vec<(ProductId, Vec<StockAllocation>)>,
    committed_coupon: Option<String>,
}

impl CompensationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_allocation(&mut self, product_id: ProductId, allocations: Vec<StockAllocation>) {
        self.allocations.push((product_id, allocations));
    }

    pub fn record_coupon(&mut self, code: impl Into<String>) {
        self.committed_coupon = Some(code.into());
    }

    pub fn allocations(&self) -> &[(ProductId, Vec<StockAllocation>)] {
        &self.allocations
    }

    pub fn committed_coupon(&self) -> Option<&str> {
        self.committed_coupon.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty() && self.committed_coupon.is_none()
    }
}
