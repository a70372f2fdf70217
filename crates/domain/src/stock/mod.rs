//! Per-warehouse stock records and multi-warehouse allocation.

mod allocator;

pub use allocator::StockAllocator;

use chrono::{DateTime, Utc};
use common::{ProductId, WarehouseId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during inventory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    /// Quantities must be positive.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Not enough units to satisfy a reduction or allocation.
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u64,
        available: u64,
    },

    /// No record for the product in the warehouse.
    #[error("Stock record not found: product {product_id} in warehouse {warehouse_id}")]
    RecordNotFound {
        product_id: ProductId,
        warehouse_id: WarehouseId,
    },

    /// A record for the product in the warehouse already exists.
    #[error("Stock record already exists: product {product_id} in warehouse {warehouse_id}")]
    RecordExists {
        product_id: ProductId,
        warehouse_id: WarehouseId,
    },

    /// Adding would exceed the representable quantity.
    #[error("Stock quantity overflow for product {product_id} in warehouse {warehouse_id}")]
    Overflow {
        product_id: ProductId,
        warehouse_id: WarehouseId,
    },
}

/// Quantity of one product held in one warehouse.
///
/// Quantities never go negative; the only mutations are [`Stock::reduce`]
/// and [`Stock::add`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    id: String,
    product_id: ProductId,
    warehouse_id: WarehouseId,
    quantity: u32,
    updated_at: DateTime<Utc>,
}

impl Stock {
    pub fn new(
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("STK-{product_id}-{warehouse_id}"),
            product_id,
            warehouse_id,
            quantity,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn warehouse_id(&self) -> &WarehouseId {
        &self.warehouse_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Takes `quantity` units out of this record.
    pub fn reduce(&mut self, quantity: u32, now: DateTime<Utc>) -> Result<(), StockError> {
        if quantity == 0 {
            return Err(StockError::InvalidQuantity { quantity });
        }
        if quantity > self.quantity {
            return Err(StockError::InsufficientStock {
                product_id: self.product_id.clone(),
                requested: u64::from(quantity),
                available: u64::from(self.quantity),
            });
        }
        self.quantity -= quantity;
        self.updated_at = now;
        Ok(())
    }

    /// Puts `quantity` units into this record.
    pub fn add(&mut self, quantity: u32, now: DateTime<Utc>) -> Result<(), StockError> {
        if quantity == 0 {
            return Err(StockError::InvalidQuantity { quantity });
        }
        self.quantity = self
            .quantity
            .checked_add(quantity)
            .ok_or_else(|| StockError::Overflow {
                product_id: self.product_id.clone(),
                warehouse_id: self.warehouse_id.clone(),
            })?;
        self.updated_at = now;
        Ok(())
    }
}

/// Units taken from one warehouse for one order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAllocation {
    pub warehouse_id: WarehouseId,
    pub quantity: u32,
}

impl StockAllocation {
    pub fn new(warehouse_id: WarehouseId, quantity: u32) -> Self {
        Self {
            warehouse_id,
            quantity,
        }
    }
}

/// Result of a read-only availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    pub sufficient: bool,
    pub total_available: u64,
}

/// Units of a product held in one warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub warehouse_id: WarehouseId,
    pub quantity: u32,
}

/// Per-warehouse breakdown of a product's stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductStock {
    pub product_id: ProductId,
    pub levels: Vec<StockLevel>,
    pub total: u64,
}

/// Sums the quantities of a set of records.
pub fn total_quantity(stocks: &[Stock]) -> u64 {
    stocks.iter().map(|s| u64::from(s.quantity)).sum()
}
