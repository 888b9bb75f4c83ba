//! API routes and handlers
//!
//! This module defines all API endpoints and their routing.

use axum::{middleware::from_fn, routing::get, Router};

use crate::{
    middleware::auth::{require_admin, require_employee},
    AppState,
};

mod admin;
mod auth;
mod employee;
mod health;

pub use health::*;

/// Public API routes (no authentication required)
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // Health check endpoints
        .route("/health", get(health::health_check))
        .route("/health/detailed", get(health::health_check_detailed))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        // Sites, registration, login and password reset
        .nest("/auth", auth::public_routes())
}

/// Protected API routes (authentication required)
///
/// Role guards run after the token middleware layered on by the caller.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::protected_routes())
        .nest(
            "/employee",
            employee::routes().route_layer(from_fn(require_employee)),
        )
        .nest("/admin", admin::routes().route_layer(from_fn(require_admin)))
}
