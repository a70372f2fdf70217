use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ProductId, WarehouseId};
use tokio::sync::RwLock;

use crate::repository::InventoryStore;
use crate::stock::{Stock, StockError};

type StockKey = (ProductId, WarehouseId);

/// In-memory inventory keyed by `(product, warehouse)`.
///
/// The `BTreeMap` ordering gives every per-product scan warehouse-id
/// ascending order for free.
#[derive(Clone, Default)]
pub struct InMemoryInventoryStore {
    stocks: Arc<RwLock<BTreeMap<StockKey, Stock>>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    pub async fn record_count(&self) -> usize {
        self.stocks.read().await.len()
    }

    /// Sum of every record of a product.
    pub async fn total_for(&self, product_id: &ProductId) -> u64 {
        let stocks = self.stocks.read().await;
        product_records(&stocks, product_id)
            .map(|s| u64::from(s.quantity()))
            .sum()
    }
}

fn key(product_id: &ProductId, warehouse_id: &WarehouseId) -> StockKey {
    (product_id.clone(), warehouse_id.clone())
}

fn product_records<'a>(
    stocks: &'a BTreeMap<StockKey, Stock>,
    product_id: &'a ProductId,
) -> impl Iterator<Item = &'a Stock> + 'a {
    stocks
        .range((product_id.clone(), WarehouseId::new(""))..)
        .take_while(move |((p, _), _)| p == product_id)
        .map(|(_, stock)| stock)
}

fn not_found(product_id: &ProductId, warehouse_id: &WarehouseId) -> StockError {
    StockError::RecordNotFound {
        product_id: product_id.clone(),
        warehouse_id: warehouse_id.clone(),
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn create(&self, stock: Stock) -> Result<(), StockError> {
        let mut stocks = self.stocks.write().await;
        let key = key(stock.product_id(), stock.warehouse_id());
        if stocks.contains_key(&key) {
            return Err(StockError::RecordExists {
                product_id: key.0,
                warehouse_id: key.1,
            });
        }
        stocks.insert(key, stock);
        Ok(())
    }

    async fn find(
        &self,
        product_id: &ProductId,
        warehouse_id: &WarehouseId,
    ) -> Result<Option<Stock>, StockError> {
        let stocks = self.stocks.read().await;
        Ok(stocks.get(&key(product_id, warehouse_id)).cloned())
    }

    async fn find_by_product(&self, product_id: &ProductId) -> Result<Vec<Stock>, StockError> {
        let stocks = self.stocks.read().await;
        Ok(product_records(&stocks, product_id).cloned().collect())
    }

    async fn find_by_warehouse(
        &self,
        warehouse_id: &WarehouseId,
    ) -> Result<Vec<Stock>, StockError> {
        let stocks = self.stocks.read().await;
        Ok(stocks
            .values()
            .filter(|s| s.warehouse_id() == warehouse_id)
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<Stock>, StockError> {
        let stocks = self.stocks.read().await;
        Ok(stocks.values().cloned().collect())
    }

    async fn reduce(
        &self,
        product_id: &ProductId,
        warehouse_id: &WarehouseId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<Stock, StockError> {
        let mut stocks = self.stocks.write().await;
        let stock = stocks
            .get_mut(&key(product_id, warehouse_id))
            .ok_or_else(|| not_found(product_id, warehouse_id))?;
        stock.reduce(quantity, now)?;
        Ok(stock.clone())
    }

    async fn increase(
        &self,
        product_id: &ProductId,
        warehouse_id: &WarehouseId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<Stock, StockError> {
        let mut stocks = self.stocks.write().await;
        let stock = stocks
            .get_mut(&key(product_id, warehouse_id))
            .ok_or_else(|| not_found(product_id, warehouse_id))?;
        stock.add(quantity, now)?;
        Ok(stock.clone())
    }

    async fn delete(
        &self,
        product_id: &ProductId,
        warehouse_id: &WarehouseId,
    ) -> Result<Stock, StockError> {
        let mut stocks = self.stocks.write().await;
        stocks
            .remove(&key(product_id, warehouse_id))
            .ok_or_else(|| not_found(product_id, warehouse_id))
    }

    async fn modify_product_stocks<F, T>(&self, product_id: &ProductId, f: F) -> Result<T, StockError>
    where
        F: FnOnce(&mut [Stock]) -> Result<T, StockError> + Send,
        T: Send,
    {
        let mut stocks = self.stocks.write().await;
        let mut snapshot: Vec<Stock> = product_records(&stocks, product_id).cloned().collect();

        let result = f(&mut snapshot)?;

        for stock in snapshot {
            stocks.insert(key(stock.product_id(), stock.warehouse_id()), stock);
        }
        Ok(result)
    }
}
