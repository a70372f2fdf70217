//! Catalog and stock endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::ProductId;
use domain::{Product, ProductCatalog, ProductStock, Warehouse, WarehouseDirectory};
use fulfillment::{FulfillmentError, PaymentGateway};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
}

/// GET /products: the catalog, optionally filtered by `?category=`.
#[tracing::instrument(skip(state))]
pub async fn list<P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<P>>>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state
        .catalog
        .find_all(query.category.as_deref())
        .await
        .map_err(FulfillmentError::from)?;
    Ok(Json(products))
}

/// GET /products/{id}/stock: per-warehouse stock levels for a product.
#[tracing::instrument(skip(state))]
pub async fn stock<P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductStock>, ApiError> {
    let product_id = ProductId::new(id);
    if state
        .catalog
        .find_by_id(&product_id)
        .await
        .map_err(FulfillmentError::from)?
        .is_none()
    {
        return Err(FulfillmentError::ProductNotFound(product_id).into());
    }

    let info = state
        .orchestrator
        .allocator()
        .stock_info(&product_id)
        .await
        .map_err(FulfillmentError::from)?;
    Ok(Json(info))
}

/// GET /warehouses: every warehouse, by id.
#[tracing::instrument(skip(state))]
pub async fn warehouses<P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<P>>>,
) -> Result<Json<Vec<Warehouse>>, ApiError> {
    let warehouses = state
        .warehouses
        .find_all()
        .await
        .map_err(FulfillmentError::from)?;
    Ok(Json(warehouses))
}
