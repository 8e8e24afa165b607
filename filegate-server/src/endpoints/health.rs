//! Liveness probe endpoint.

use axum::response::IntoResponse;
use axum::{Router, routing};

use crate::state::ServiceState;

/// Creates a router with the health endpoint.
pub fn router() -> Router<ServiceState> {
    Router::new().route("/health", routing::get(health))
}

async fn health() -> impl IntoResponse {
    "OK"
}
