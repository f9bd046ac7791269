//! HTTP adapter - axum application state, router, and endpoints.

mod analysis;
mod billing;
mod error;
pub mod middleware;

pub use analysis::analysis_router;
pub use billing::billing_router;
pub use error::ApiError;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::application::handlers::analysis::AnalysisService;
use crate::application::handlers::billing::CheckoutService;
use crate::config::ServerConfig;
use crate::domain::billing::{StripeWebhookVerifier, WebhookProcessor};
use crate::ports::{EntitlementStore, TokenVerifier};

use middleware::auth_middleware;

/// Body limit covering the largest accepted upload (10 MiB photo) plus
/// multipart framing.
const MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub analysis: Arc<AnalysisService>,
    pub checkout: Arc<CheckoutService>,
    pub webhook_verifier: Arc<StripeWebhookVerifier>,
    pub webhook_processor: Arc<WebhookProcessor>,
    pub entitlements: Arc<dyn EntitlementStore>,
    pub token_verifier: Arc<dyn TokenVerifier>,
}

/// Builds the full application router.
pub fn app_router(state: AppState, server: &ServerConfig) -> Router {
    let cors = cors_layer(server);

    Router::new()
        .merge(analysis_router())
        .merge(billing_router())
        .route("/health", get(health))
        .layer(axum::middleware::from_fn_with_state(
            state.token_verifier.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_secs,
        )))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    if origins.is_empty() {
        // Development fallback; production configs set explicit origins.
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
    }
}

/// GET /health - liveness check.
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
