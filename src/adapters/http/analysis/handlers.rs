//! Handlers for the analysis endpoints.
//!
//! Each handler validates its input shape, resolves the caller identity
//! (authenticated user or cookie-counted visitor), and delegates to the
//! gated pipeline. Visitor responses carry a refreshed counter cookie.

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::application::handlers::analysis::{
    AnalysisInput, AnalysisOutcome, ChargeOutcome, RequestIdentity,
};
use crate::domain::credits::ServiceKind;
use crate::ports::{AuthenticatedUser, TextSurface};

use super::super::error::ApiError;
use super::super::middleware::OptionalAuth;
use super::super::AppState;
use super::dto::{AnalysisResponse, EssayRequest, ProfileRequest, MAX_TEXT_CHARS};
use super::extract::{
    image_from_multipart, pdf_text_from_multipart, validate_text_length,
    visitor_usage_from_headers,
};

fn identity(user: Option<AuthenticatedUser>, headers: &HeaderMap) -> RequestIdentity {
    match user {
        Some(user) => RequestIdentity::User(user),
        None => RequestIdentity::Visitor(visitor_usage_from_headers(headers)),
    }
}

/// Converts a pipeline outcome into a response, attaching the visitor cookie
/// when the charge was an anonymous counter bump.
fn respond(outcome: AnalysisOutcome) -> Response {
    let mut credits_remaining = None;
    let mut visitor_analyses_used = None;
    let mut cookie = None;

    match outcome.charge {
        ChargeOutcome::CreditsCharged { remaining, .. } => credits_remaining = Some(remaining),
        ChargeOutcome::VisitorCounted { usage } => {
            visitor_analyses_used = Some(usage.count());
            cookie = Some(usage.set_cookie_value());
        }
        ChargeOutcome::NotCharged => {}
    }

    let body = Json(AnalysisResponse {
        report: outcome.report,
        credits_remaining,
        visitor_analyses_used,
    });

    match cookie {
        Some(cookie) => ([(header::SET_COOKIE, cookie)], body).into_response(),
        None => body.into_response(),
    }
}

/// POST /api/analyze/resume - multipart PDF upload.
pub async fn analyze_resume(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    // Quota is checked before the PDF is read so an exhausted caller is
    // turned away without paying for extraction.
    let caller = identity(user, &headers);
    state
        .analysis
        .check_quota(&caller, ServiceKind::Resume)
        .await?;

    let text = pdf_text_from_multipart(multipart).await?;

    let outcome = state
        .analysis
        .run(
            caller,
            AnalysisInput::Text {
                surface: TextSurface::Resume,
                text,
            },
        )
        .await?;

    Ok(respond(outcome))
}

/// POST /api/analyze/essay - JSON text body.
pub async fn analyze_essay(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    headers: HeaderMap,
    Json(request): Json<EssayRequest>,
) -> Result<Response, ApiError> {
    validate_text_length(&request.text, MAX_TEXT_CHARS)?;

    let outcome = state
        .analysis
        .run(
            identity(user, &headers),
            AnalysisInput::Text {
                surface: TextSurface::Essay,
                text: request.text.trim().to_string(),
            },
        )
        .await?;

    Ok(respond(outcome))
}

/// POST /api/analyze/profile - JSON headline/bio body.
pub async fn analyze_profile(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    headers: HeaderMap,
    Json(request): Json<ProfileRequest>,
) -> Result<Response, ApiError> {
    let text = request.combined_text();
    validate_text_length(&text, MAX_TEXT_CHARS)?;

    let outcome = state
        .analysis
        .run(
            identity(user, &headers),
            AnalysisInput::Text {
                surface: TextSurface::Profile,
                text,
            },
        )
        .await?;

    Ok(respond(outcome))
}

/// POST /api/analyze/photo - multipart image upload.
pub async fn analyze_photo(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    // Same ordering as the resume endpoint: reject before buffering the
    // upload.
    let caller = identity(user, &headers);
    state
        .analysis
        .check_quota(&caller, ServiceKind::Photo)
        .await?;

    let (media_type, bytes) = image_from_multipart(multipart).await?;

    let outcome = state
        .analysis
        .run(caller, AnalysisInput::Image { media_type, bytes })
        .await?;

    Ok(respond(outcome))
}
