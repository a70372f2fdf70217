use std::sync::Arc;

use common::{Clock, ProductId, SystemClock};
use tracing::{debug, instrument};

use super::{
    Availability, ProductStock, Stock, StockAllocation, StockError, StockLevel, total_quantity,
};
use crate::repository::InventoryStore;

/// Decides how many units to take from which warehouse and reverses that
/// decision exactly on compensation.
///
/// Warehouses are consumed in ascending id order, so the same stock state and
/// request always yield the same allocation.
#[derive(Clone)]
pub struct StockAllocator<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: InventoryStore> StockAllocator<S> {
    /// Creates an allocator using the system clock.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Sums the product's stock across warehouses. Mutates nothing.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn check_availability(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Availability, StockError> {
        ensure_positive(quantity)?;

        let stocks = self.store.find_by_product(product_id).await?;
        let total_available = total_quantity(&stocks);

        Ok(Availability {
            sufficient: total_available >= u64::from(quantity),
            total_available,
        })
    }

    /// Takes `quantity` units of the product, draining warehouses greedily.
    ///
    /// The total is validated before any record is touched, and the store
    /// lock is held for the whole scan, so either the full quantity is
    /// allocated or nothing changes.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn allocate(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Vec<StockAllocation>, StockError> {
        ensure_positive(quantity)?;

        let now = self.clock.now();
        let requested_product = product_id.clone();

        let allocations = self
            .store
            .modify_product_stocks(product_id, move |stocks: &mut [Stock]| {
                let available = total_quantity(stocks);
                if available < u64::from(quantity) {
                    return Err(StockError::InsufficientStock {
                        product_id: requested_product,
                        requested: u64::from(quantity),
                        available,
                    });
                }

                let mut remaining = quantity;
                let mut allocations = Vec::new();
                for stock in stocks.iter_mut() {
                    if remaining == 0 {
                        break;
                    }
                    let take = remaining.min(stock.quantity());
                    if take == 0 {
                        continue;
                    }
                    stock.reduce(take, now)?;
                    allocations.push(StockAllocation::new(stock.warehouse_id().clone(), take));
                    remaining -= take;
                }

                Ok(allocations)
            })
            .await?;

        metrics::counter!("stock_allocations_total").increment(1);
        debug!(warehouses = allocations.len(), quantity, "Stock allocated");

        Ok(allocations)
    }

    /// Puts previously allocated units back into the warehouses they came
    /// from. A record deleted in the meantime is recreated empty first.
    #[instrument(skip(self, allocations), fields(product_id = %product_id))]
    pub async fn restore(
        &self,
        product_id: &ProductId,
        allocations: &[StockAllocation],
    ) -> Result<(), StockError> {
        let now = self.clock.now();

        for allocation in allocations.iter().filter(|a| a.quantity > 0) {
            let existing = self.store.find(product_id, &allocation.warehouse_id).await?;
            if existing.is_none() {
                let record = Stock::new(product_id.clone(), allocation.warehouse_id.clone(), 0, now);
                match self.store.create(record).await {
                    Ok(()) | Err(StockError::RecordExists { .. }) => {}
                    Err(e) => return Err(e),
                }
            }

            self.store
                .increase(product_id, &allocation.warehouse_id, allocation.quantity, now)
                .await?;
        }

        debug!(warehouses = allocations.len(), "Stock restored");
        Ok(())
    }

    /// Per-warehouse breakdown of a product's stock.
    pub async fn stock_info(&self, product_id: &ProductId) -> Result<ProductStock, StockError> {
        let stocks = self.store.find_by_product(product_id).await?;
        let total = total_quantity(&stocks);
        let levels = stocks
            .into_iter()
            .map(|s| StockLevel {
                warehouse_id: s.warehouse_id().clone(),
                quantity: s.quantity(),
            })
            .collect();

        Ok(ProductStock {
            product_id: product_id.clone(),
            levels,
            total,
        })
    }
}

fn ensure_positive(quantity: u32) -> Result<(), StockError> {
    if quantity == 0 {
        return Err(StockError::InvalidQuantity { quantity });
    }
    Ok(())
}
