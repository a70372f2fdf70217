//! Order placement, lookup and administration endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{Money, Order, OrderItem};
use fulfillment::{PaymentGateway, PlaceOrderRequest};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::request_context;
use crate::error::ApiError;
use crate::state::AppState;

// -- Response types --

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub items: Vec<OrderItemResponse>,
    pub applied_coupon: Option<String>,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping_fee: Money,
    pub discount: Money,
    pub total: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            subtotal: item.subtotal,
        }
    }
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            user_id: order.user_id().to_string(),
            status: order.status().to_string(),
            items: order.items().iter().map(OrderItemResponse::from).collect(),
            applied_coupon: order.applied_coupon().map(String::from),
            subtotal: order.subtotal(),
            tax: order.tax(),
            shipping_fee: order.shipping_fee(),
            discount: order.discount(),
            total: order.total(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

// -- Handlers --

/// POST /orders: run the fulfillment saga for a cart.
///
/// The saga runs on its own task. If the client goes away the request's
/// cancellation token fires: before payment succeeds that aborts the order,
/// afterwards the saga runs to completion so nothing is left half-applied.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<P>>>,
    headers: HeaderMap,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let cancellation = CancellationToken::new();
    let _cancel_on_drop = cancellation.clone().drop_guard();
    let ctx = request_context(&headers).with_cancellation(cancellation);

    let saga = tokio::spawn(async move { state.orchestrator.place_order(&ctx, req).await });
    let order = saga
        .await
        .map_err(|e| ApiError::Internal(format!("order task failed: {e}")))??;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /orders: the caller's orders, oldest first.
#[tracing::instrument(skip(state, headers))]
pub async fn list<P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<P>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state
        .orchestrator
        .list_user_orders(&request_context(&headers))
        .await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// GET /orders/{id}: one order, visible to its owner and admins.
#[tracing::instrument(skip(state, headers))]
pub async fn get<P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<P>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orchestrator
        .get_order(&request_context(&headers), &OrderId::new(id))
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{id}/cancel: admin only.
#[tracing::instrument(skip(state, headers))]
pub async fn cancel<P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<P>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orchestrator
        .cancel_order(&request_context(&headers), &OrderId::new(id))
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{id}/deliver: admin only.
#[tracing::instrument(skip(state, headers))]
pub async fn deliver<P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<P>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orchestrator
        .mark_delivered(&request_context(&headers), &OrderId::new(id))
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}
