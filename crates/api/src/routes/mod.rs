//! HTTP route handlers.

pub mod admin;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use axum::http::HeaderMap;
use fulfillment::RequestContext;

/// Header carrying the authenticated user id, set by the upstream gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Builds the call context from request headers. A missing or blank header
/// yields an anonymous caller.
pub fn request_context(headers: &HeaderMap) -> RequestContext {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(RequestContext::for_user)
        .unwrap_or_else(RequestContext::anonymous)
}
