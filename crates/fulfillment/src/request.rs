//! Order placement input.

use common::ProductId;
use serde::{Deserialize, Serialize};

/// One requested cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl OrderLine {
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A cart submitted for fulfillment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

impl PlaceOrderRequest {
    pub fn new(items: Vec<OrderLine>) -> Self {
        Self {
            items,
            coupon_code: None,
        }
    }

    pub fn with_coupon(mut self, code: impl Into<String>) -> Self {
        self.coupon_code = Some(code.into());
        self
    }
}
