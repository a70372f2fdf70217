//! Sales report generation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use common::{Clock, ProductId, SystemClock, WarehouseId};
use domain::{InventoryStore, Money, Order, OrderRepository, Stock, Warehouse, WarehouseDirectory};
use tracing::{info, instrument};

use crate::Result;
use crate::report::{CouponAnalytics, ProductSales, SalesReport, SalesSummary, WarehouseStock};

/// Number of entries in [`SalesReport::top_products`].
pub const TOP_PRODUCTS_LIMIT: usize = 3;

/// Builds sales reports from the order repository and the inventory.
///
/// Only fulfilled orders (`completed` or `delivered`) count as sales.
pub struct SalesReportService<S> {
    orders: Arc<dyn OrderRepository>,
    inventory: S,
    warehouses: Arc<dyn WarehouseDirectory>,
    clock: Arc<dyn Clock>,
}

impl<S: InventoryStore> SalesReportService<S> {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        inventory: S,
        warehouses: Arc<dyn WarehouseDirectory>,
    ) -> Self {
        Self {
            orders,
            inventory,
            warehouses,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[instrument(skip(self))]
    pub async fn generate(&self) -> Result<SalesReport> {
        let start = Instant::now();

        let orders = self.orders.find_all().await?;
        let fulfilled: Vec<&Order> = orders.iter().filter(|o| o.status().is_fulfilled()).collect();

        let stocks = self.inventory.find_all().await?;
        let warehouses = self.warehouses.find_all().await?;

        let report = SalesReport {
            generated_at: self.clock.now(),
            sales_summary: sales_summary(&fulfilled),
            top_products: top_products(&fulfilled, TOP_PRODUCTS_LIMIT),
            warehouse_stock: warehouse_stock(&stocks, &warehouses),
            coupon_analytics: coupon_analytics(&fulfilled),
        };

        metrics::counter!("sales_reports_generated_total").increment(1);
        metrics::histogram!("sales_report_duration_seconds").record(start.elapsed().as_secs_f64());
        info!(
            orders = orders.len(),
            fulfilled = fulfilled.len(),
            revenue = %report.sales_summary.total_revenue,
            "Sales report generated"
        );

        Ok(report)
    }
}

fn sales_summary(orders: &[&Order]) -> SalesSummary {
    SalesSummary {
        total_revenue: orders.iter().map(|o| o.total()).sum(),
        order_count: orders.len() as u64,
        total_discount: orders.iter().map(|o| o.discount()).sum(),
    }
}

/// Highest quantity first; equal quantities ordered by product id.
fn top_products(orders: &[&Order], limit: usize) -> Vec<ProductSales> {
    let mut by_product: HashMap<ProductId, ProductSales> = HashMap::new();

    for item in orders.iter().flat_map(|o| o.items()) {
        let sales = by_product
            .entry(item.product_id.clone())
            .or_insert_with(|| ProductSales {
                product_id: item.product_id.clone(),
                product_name: item.product_name.clone(),
                quantity_sold: 0,
                revenue: Money::zero(),
            });
        sales.quantity_sold += u64::from(item.quantity);
        sales.revenue += item.subtotal;
    }

    let mut products: Vec<_> = by_product.into_values().collect();
    products.sort_by(|a, b| {
        b.quantity_sold
            .cmp(&a.quantity_sold)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    products.truncate(limit);
    products
}

/// Every warehouse in the directory or holding stock, by id ascending.
fn warehouse_stock(stocks: &[Stock], warehouses: &[Warehouse]) -> Vec<WarehouseStock> {
    let mut totals: BTreeMap<WarehouseId, WarehouseStock> = warehouses
        .iter()
        .map(|w| {
            (
                w.id.clone(),
                WarehouseStock {
                    warehouse_id: w.id.clone(),
                    warehouse_name: w.name.clone(),
                    product_count: 0,
                    total_quantity: 0,
                },
            )
        })
        .collect();

    for stock in stocks {
        let entry = totals
            .entry(stock.warehouse_id().clone())
            .or_insert_with(|| WarehouseStock {
                warehouse_id: stock.warehouse_id().clone(),
                warehouse_name: String::new(),
                product_count: 0,
                total_quantity: 0,
            });
        entry.product_count += 1;
        entry.total_quantity += u64::from(stock.quantity());
    }

    totals.into_values().collect()
}

fn coupon_analytics(orders: &[&Order]) -> CouponAnalytics {
    let with_coupon = orders
        .iter()
        .filter(|o| o.applied_coupon().is_some())
        .count() as u64;
    CouponAnalytics::new(with_coupon, orders.len() as u64)
}
