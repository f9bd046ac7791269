//! Route table for the billing endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::super::AppState;
use super::handlers;

/// Builds the billing router.
pub fn billing_router() -> Router<AppState> {
    Router::new()
        .route("/api/checkout", post(handlers::create_checkout))
        .route("/api/webhooks/stripe", post(handlers::stripe_webhook))
        .route("/api/credits", get(handlers::get_credits))
}
