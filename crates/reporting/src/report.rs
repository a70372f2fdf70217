//! Report data types.

use chrono::{DateTime, Utc};
use common::{ProductId, WarehouseId};
use domain::Money;
use serde::{Deserialize, Serialize};

/// Revenue from fulfilled orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub total_revenue: Money,
    pub order_count: u64,
    pub total_discount: Money,
}

/// Units and revenue for one product across fulfilled orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSales {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity_sold: u64,
    /// Sum of line subtotals, before tax, shipping and discounts.
    pub revenue: Money,
}

/// Units currently held by one warehouse, all products combined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseStock {
    pub warehouse_id: WarehouseId,
    /// Empty when the warehouse is not in the directory.
    pub warehouse_name: String,
    pub product_count: u64,
    pub total_quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponAnalytics {
    pub orders_with_coupon: u64,
    pub fulfilled_orders: u64,
    /// `orders_with_coupon / fulfilled_orders × 100`, or 0 with no orders.
    pub usage_rate_percent: f64,
}

impl CouponAnalytics {
    pub fn new(orders_with_coupon: u64, fulfilled_orders: u64) -> Self {
        let usage_rate_percent = if fulfilled_orders == 0 {
            0.0
        } else {
            orders_with_coupon as f64 / fulfilled_orders as f64 * 100.0
        };
        Self {
            orders_with_coupon,
            fulfilled_orders,
            usage_rate_percent,
        }
    }
}

/// Snapshot report for administrators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesReport {
    pub generated_at: DateTime<Utc>,
    pub sales_summary: SalesSummary,
    pub top_products: Vec<ProductSales>,
    pub warehouse_stock: Vec<WarehouseStock>,
    pub coupon_analytics: CouponAnalytics,
}
