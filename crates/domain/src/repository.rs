//! Storage ports.
//!
//! Every store hands out owned snapshots; callers never hold references into
//! shared state. Implementations guard their state with a lock scoped to a
//! single store-level operation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId, WarehouseId};

use crate::catalog::{Product, Warehouse};
use crate::coupon::{Coupon, CouponError};
use crate::error::RepositoryError;
use crate::order::Order;
use crate::stock::{Stock, StockError};

/// Per-(product, warehouse) stock records.
///
/// Not object safe: `modify_product_stocks` is generic over the mutation, so
/// consumers take the store as a type parameter.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Inserts a new record. Fails with `RecordExists` if one is present.
    async fn create(&self, stock: Stock) -> Result<(), StockError>;

    async fn find(
        &self,
        product_id: &ProductId,
        warehouse_id: &WarehouseId,
    ) -> Result<Option<Stock>, StockError>;

    /// Returns every record for a product, ordered by warehouse id ascending.
    async fn find_by_product(&self, product_id: &ProductId) -> Result<Vec<Stock>, StockError>;

    /// Returns every record held by a warehouse, ordered by product id.
    async fn find_by_warehouse(&self, warehouse_id: &WarehouseId)
    -> Result<Vec<Stock>, StockError>;

    /// Returns every record, ordered by product then warehouse.
    async fn find_all(&self) -> Result<Vec<Stock>, StockError>;

    async fn reduce(
        &self,
        product_id: &ProductId,
        warehouse_id: &WarehouseId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<Stock, StockError>;

    async fn increase(
        &self,
        product_id: &ProductId,
        warehouse_id: &WarehouseId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<Stock, StockError>;

    async fn delete(
        &self,
        product_id: &ProductId,
        warehouse_id: &WarehouseId,
    ) -> Result<Stock, StockError>;

    /// Runs `f` over snapshots of every record of `product_id` (warehouse id
    /// ascending) while holding the store lock.
    ///
    /// On `Ok` all snapshots are written back; on `Err` nothing is written.
    async fn modify_product_stocks<F, T>(&self, product_id: &ProductId, f: F) -> Result<T, StockError>
    where
        F: FnOnce(&mut [Stock]) -> Result<T, StockError> + Send,
        T: Send;
}

/// Coupons keyed by their unique code.
#[async_trait]
pub trait CouponStore: Send + Sync {
    async fn create(&self, coupon: Coupon) -> Result<(), CouponError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, CouponError>;

    async fn find_all(&self) -> Result<Vec<Coupon>, CouponError>;

    /// Applies `f` to the stored coupon under the store lock. The change is
    /// kept only if `f` succeeds. Missing coupons yield `NotFound`.
    async fn modify<F, T>(&self, code: &str, f: F) -> Result<T, CouponError>
    where
        F: FnOnce(&mut Coupon) -> Result<T, CouponError> + Send,
        T: Send;
}

/// Order persistence.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Stores a new order. Fails with `AlreadyExists` on a duplicate id.
    async fn save(&self, order: &Order) -> Result<(), RepositoryError>;

    /// Replaces a stored order. Fails with `NotFound` if absent.
    async fn update(&self, order: &Order) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Orders of one user, oldest first.
    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Order>, RepositoryError>;

    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError>;
}

/// Product lookup.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn create(&self, product: Product) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Products ordered by id, optionally restricted to one category.
    async fn find_all(&self, category: Option<&str>) -> Result<Vec<Product>, RepositoryError>;
}

/// Warehouse lookup.
#[async_trait]
pub trait WarehouseDirectory: Send + Sync {
    async fn create(&self, warehouse: Warehouse) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &WarehouseId) -> Result<Option<Warehouse>, RepositoryError>;

    /// Warehouses ordered by id.
    async fn find_all(&self) -> Result<Vec<Warehouse>, RepositoryError>;
}
