use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{ProductId, WarehouseId};
use tokio::sync::RwLock;

use crate::catalog::{Product, Warehouse};
use crate::error::RepositoryError;
use crate::repository::{ProductCatalog, WarehouseDirectory};

/// In-memory product catalog.
#[derive(Clone, Default)]
pub struct InMemoryProductCatalog {
    products: Arc<RwLock<BTreeMap<ProductId, Product>>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn create(&self, product: Product) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        if products.contains_key(&product.id) {
            return Err(RepositoryError::already_exists("product", &product.id));
        }
        products.insert(product.id.clone(), product);
        Ok(())
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn find_all(&self, category: Option<&str>) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .products
            .read()
            .await
            .values()
            .filter(|p| category.is_none_or(|c| p.category == c))
            .cloned()
            .collect())
    }
}

/// In-memory warehouse directory.
#[derive(Clone, Default)]
pub struct InMemoryWarehouseDirectory {
    warehouses: Arc<RwLock<BTreeMap<WarehouseId, Warehouse>>>,
}

impl InMemoryWarehouseDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WarehouseDirectory for InMemoryWarehouseDirectory {
    async fn create(&self, warehouse: Warehouse) -> Result<(), RepositoryError> {
        let mut warehouses = self.warehouses.write().await;
        if warehouses.contains_key(&warehouse.id) {
            return Err(RepositoryError::already_exists("warehouse", &warehouse.id));
        }
        warehouses.insert(warehouse.id.clone(), warehouse);
        Ok(())
    }

    async fn find_by_id(&self, id: &WarehouseId) -> Result<Option<Warehouse>, RepositoryError> {
        Ok(self.warehouses.read().await.get(id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Warehouse>, RepositoryError> {
        Ok(self.warehouses.read().await.values().cloned().collect())
    }
}
