//! Administrative reports.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use fulfillment::PaymentGateway;
use reporting::SalesReport;

use super::request_context;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /admin/reports/sales: admin only.
#[tracing::instrument(skip(state, headers))]
pub async fn sales_report<P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<P>>>,
    headers: HeaderMap,
) -> Result<Json<SalesReport>, ApiError> {
    state
        .orchestrator
        .require_admin(&request_context(&headers))
        .await?;
    Ok(Json(state.reports.generate().await?))
}
