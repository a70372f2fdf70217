//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CouponError, OrderError};
use fulfillment::FulfillmentError;
use reporting::ReportError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Order placement or administration error.
    #[error(transparent)]
    Fulfillment(#[from] FulfillmentError),
    /// Report generation error.
    #[error(transparent)]
    Report(#[from] ReportError),
    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Fulfillment(err) => fulfillment_status(err),
            ApiError::Report(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        metrics::counter!("http_errors_total", "status" => status.as_u16().to_string()).increment(1);
        if status.is_server_error() {
            tracing::error!(error = %message, %status, "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn fulfillment_status(err: &FulfillmentError) -> StatusCode {
    match err {
        FulfillmentError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
        FulfillmentError::AccessDenied(_) => StatusCode::FORBIDDEN,
        FulfillmentError::ProductNotFound(_) | FulfillmentError::OrderNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        FulfillmentError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        FulfillmentError::InsufficientStock { .. } | FulfillmentError::FulfillmentFailed { .. } => {
            StatusCode::CONFLICT
        }
        FulfillmentError::CouponInvalid(CouponError::NotFound { .. }) => StatusCode::NOT_FOUND,
        FulfillmentError::CouponInvalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        FulfillmentError::PaymentDeclined { .. } => StatusCode::PAYMENT_REQUIRED,
        FulfillmentError::PaymentSystemError { .. } => StatusCode::SERVICE_UNAVAILABLE,
        FulfillmentError::Order(order_err) => match order_err {
            OrderError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        },
        FulfillmentError::Inventory(_) | FulfillmentError::Repository(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderId, ProductId};

    fn status_of(err: FulfillmentError) -> StatusCode {
        ApiError::from(err).status()
    }

    #[test]
    fn test_fulfillment_errors_map_to_statuses() {
        let order_id = || OrderId::new("ORD-1");

        assert_eq!(
            status_of(FulfillmentError::AuthenticationRequired),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(FulfillmentError::AccessDenied("nope".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(FulfillmentError::ProductNotFound(ProductId::new("P9"))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(FulfillmentError::InsufficientStock {
                product_id: ProductId::new("P1"),
                requested: 5,
                available: 1,
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(CouponError::Expired { code: "OLD".into() }.into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(CouponError::NotFound { code: "NOPE".into() }.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(FulfillmentError::PaymentDeclined {
                order_id: order_id(),
                reason: "card declined".into(),
            }),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            status_of(FulfillmentError::PaymentSystemError {
                order_id: order_id(),
                reason: "timeout".into(),
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(
                OrderError::InvalidStateTransition {
                    current_state: domain::OrderStatus::Delivered,
                    action: "cancel",
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
    }
}
