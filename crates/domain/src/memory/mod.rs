//! In-memory store implementations.
//!
//! Each store keeps its state behind one `tokio::sync::RwLock` and returns
//! clones, so callers always work on snapshots.

mod catalog;
mod coupon;
mod inventory;
mod order;

pub use catalog::{InMemoryProductCatalog, InMemoryWarehouseDirectory};
pub use coupon::InMemoryCouponStore;
pub use inventory::InMemoryInventoryStore;
pub use order::InMemoryOrderRepository;
