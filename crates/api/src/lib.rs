//! HTTP API server with observability for the order fulfillment system.
//!
//! Provides REST endpoints for order placement, lookup and administration,
//! catalog and stock queries and sales reports, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod seed;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use fulfillment::PaymentGateway;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::ApiError;
pub use state::{AppState, Orchestrator, create_default_state};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<P: PaymentGateway + 'static>(
    state: Arc<AppState<P>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/orders",
            post(routes::orders::create::<P>).get(routes::orders::list::<P>),
        )
        .route("/orders/{id}", get(routes::orders::get::<P>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<P>))
        .route("/orders/{id}/deliver", post(routes::orders::deliver::<P>))
        .route("/products", get(routes::products::list::<P>))
        .route("/products/{id}/stock", get(routes::products::stock::<P>))
        .route("/warehouses", get(routes::products::warehouses::<P>))
        .route("/admin/reports/sales", get(routes::admin::sales_report::<P>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
