//! Value objects for the order domain.

use common::ProductId;
use serde::{Deserialize, Serialize};

use super::OrderError;
use crate::money::Money;

/// A line in an order, with the product name and price captured at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    /// quantity × unit_price
    pub subtotal: Money,
}

impl OrderItem {
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Result<Self, OrderError> {
        let subtotal = unit_price
            .checked_multiply(quantity)
            .ok_or(OrderError::AmountOverflow)?;
        Ok(Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            unit_price,
            subtotal,
        })
    }
}

/// Tax and shipping rules applied when an order is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub tax_rate_percent: u32,
    /// Subtotals at or above this ship free.
    pub free_shipping_threshold: Money,
    pub shipping_fee: Money,
}

impl PricingPolicy {
    /// Tax on a subtotal, rounded down.
    pub fn tax_for(&self, subtotal: Money) -> Result<Money, OrderError> {
        subtotal
            .checked_percent(self.tax_rate_percent)
            .ok_or(OrderError::AmountOverflow)
    }

    pub fn shipping_for(&self, subtotal: Money) -> Money {
        if subtotal >= self.free_shipping_threshold {
            Money::zero()
        } else {
            self.shipping_fee
        }
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate_percent: 10,
            free_shipping_threshold: Money::from_minor(5000),
            shipping_fee: Money::from_minor(500),
        }
    }
}
