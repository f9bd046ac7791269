//! Route table for the analysis endpoints.

use axum::routing::post;
use axum::Router;

use super::super::AppState;
use super::handlers;

/// Builds the /api/analyze router.
pub fn analysis_router() -> Router<AppState> {
    Router::new()
        .route("/api/analyze/resume", post(handlers::analyze_resume))
        .route("/api/analyze/essay", post(handlers::analyze_essay))
        .route("/api/analyze/profile", post(handlers::analyze_profile))
        .route("/api/analyze/photo", post(handlers::analyze_photo))
}
