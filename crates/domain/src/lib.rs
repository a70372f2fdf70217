//! Domain layer for the order fulfillment system.
//!
//! This crate provides:
//! - Catalog entities (products, warehouses, users) and `Money`
//! - The Order aggregate with its pricing rules and state machine
//! - Per-warehouse stock records and the multi-warehouse `StockAllocator`
//! - Coupons and the usage-counting `CouponLedger`
//! - Storage ports and their in-memory implementations

pub mod catalog;
pub mod coupon;
pub mod error;
pub mod memory;
pub mod money;
pub mod order;
pub mod repository;
pub mod stock;

pub use catalog::{Product, User, Warehouse};
pub use coupon::{Coupon, CouponDiscount, CouponError, CouponLedger};
pub use error::{DomainError, RepositoryError, ValidationError};
pub use memory::{
    InMemoryCouponStore, InMemoryInventoryStore, InMemoryOrderRepository, InMemoryProductCatalog,
    InMemoryWarehouseDirectory,
};
pub use money::Money;
pub use order::{Order, OrderError, OrderItem, OrderStatus, PricingPolicy};
pub use repository::{
    CouponStore, InventoryStore, OrderRepository, ProductCatalog, WarehouseDirectory,
};
pub use stock::{
    Availability, ProductStock, Stock, StockAllocation, StockAllocator, StockError, StockLevel,
};
