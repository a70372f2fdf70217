//! Read side for administrative reporting.
//!
//! [`SalesReportService`] folds the order history and the current inventory
//! into a [`SalesReport`]:
//! - sales summary (revenue and count of fulfilled orders)
//! - top products by quantity sold
//! - total stock per warehouse
//! - coupon usage rate

pub mod error;
pub mod report;
pub mod service;

pub use error::{ReportError, Result};
pub use report::{CouponAnalytics, ProductSales, SalesReport, SalesSummary, WarehouseStock};
pub use service::{SalesReportService, TOP_PRODUCTS_LIMIT};
