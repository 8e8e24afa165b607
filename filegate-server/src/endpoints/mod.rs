//! Contains all HTTP endpoint handlers.
//!
//! Use [`routes`] to create a router with all endpoints.

use axum::Router;

use crate::state::ServiceState;

mod accounts;
pub mod common;
pub mod health;
mod objects;

/// Creates a router with all gateway endpoints.
pub fn routes() -> Router<ServiceState> {
    let api = Router::new()
        .merge(objects::router())
        .merge(accounts::router());

    Router::new().merge(health::router()).nest("/api", api)
}
