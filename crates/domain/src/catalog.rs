//! Catalog entities: products, warehouses and users.

use chrono::{DateTime, Utc};
use common::{ProductId, UserId, WarehouseId};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;

/// A sellable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a product, rejecting empty ids/names/categories and negative prices.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        description: impl Into<String>,
        price: Money,
        category: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let product = Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            price,
            category: category.into(),
            created_at: now,
            updated_at: now,
        };

        if product.id.is_empty() {
            return Err(ValidationError::new("product", "id is required"));
        }
        if product.name.trim().is_empty() {
            return Err(ValidationError::new("product", "name is required"));
        }
        if product.category.trim().is_empty() {
            return Err(ValidationError::new("product", "category is required"));
        }
        if product.price.is_negative() {
            return Err(ValidationError::new("product", "price must not be negative"));
        }

        Ok(product)
    }
}

/// A physical stocking location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

impl Warehouse {
    pub fn new(
        id: impl Into<WarehouseId>,
        name: impl Into<String>,
        location: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let warehouse = Self {
            id: id.into(),
            name: name.into(),
            location: location.into(),
            created_at: now,
        };

        if warehouse.id.is_empty() {
            return Err(ValidationError::new("warehouse", "id is required"));
        }
        if warehouse.name.trim().is_empty() {
            return Err(ValidationError::new("warehouse", "name is required"));
        }

        Ok(warehouse)
    }
}

/// A known caller. Admins may read and administer every order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub is_admin: bool,
}

impl User {
    pub fn new(id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            is_admin: false,
        }
    }

    pub fn admin(id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            is_admin: true,
            ..Self::new(id, username)
        }
    }

    /// Returns true if this user may read or administer orders owned by `owner`.
    pub fn can_access(&self, owner: &UserId) -> bool {
        self.is_admin || &self.id == owner
    }
}
