//! Domain error types.

use thiserror::Error;

use crate::coupon::CouponError;
use crate::order::OrderError;
use crate::stock::StockError;

/// Errors raised by entity repositories (orders, products, warehouses, users).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// No record with the given key.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A record with the given key is already stored.
    #[error("{entity} already exists: {key}")]
    AlreadyExists { entity: &'static str, key: String },
}

impl RepositoryError {
    pub fn not_found(entity: &'static str, key: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn already_exists(entity: &'static str, key: impl std::fmt::Display) -> Self {
        Self::AlreadyExists {
            entity,
            key: key.to_string(),
        }
    }
}

/// An entity was constructed with invalid field values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {entity}: {reason}")]
pub struct ValidationError {
    pub entity: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(entity: &'static str, reason: impl Into<String>) -> Self {
        Self {
            entity,
            reason: reason.into(),
        }
    }
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the order aggregate.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// An inventory operation failed.
    #[error("Stock error: {0}")]
    Stock(#[from] StockError),

    /// A coupon operation failed.
    #[error("Coupon error: {0}")]
    Coupon(#[from] CouponError),

    /// A repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// An entity failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
