//! Handlers for the billing endpoints.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domain::billing::WebhookError;
use crate::domain::credits::PlanTier;

use super::super::error::ApiError;
use super::super::middleware::RequireAuth;
use super::super::AppState;
use super::dto::{CheckoutRequestDto, CheckoutResponseDto, CreditsResponseDto};

/// POST /api/checkout - creates a hosted checkout session.
pub async fn create_checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CheckoutRequestDto>,
) -> Result<Json<CheckoutResponseDto>, ApiError> {
    let intent = request.to_intent()?;

    let session = state
        .checkout
        .create(user.id, intent, request.return_url)
        .await?;

    Ok(Json(CheckoutResponseDto {
        session_id: session.id,
        url: session.url,
    }))
}

/// POST /api/webhooks/stripe - signed event intake.
///
/// Signature verification happens before any parsing of the body. The
/// response status drives Stripe's redelivery: 2xx acknowledges, 4xx drops,
/// 5xx retries.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let event = match state.webhook_verifier.verify_and_parse(&body, signature) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected webhook delivery");
            return webhook_error_response(&e);
        }
    };

    let event_id = event.id.clone();
    match state.webhook_processor.process(event).await {
        Ok(outcome) => {
            tracing::debug!(event_id = %event_id, ?outcome, "Webhook acknowledged");
            (StatusCode::OK, Json(json!({ "received": true }))).into_response()
        }
        Err(e) => {
            tracing::error!(event_id = %event_id, error = %e, "Webhook processing failed");
            webhook_error_response(&e)
        }
    }
}

fn webhook_error_response(error: &WebhookError) -> Response {
    (
        error.status_code(),
        Json(json!({ "error": error.to_string() })),
    )
        .into_response()
}

/// GET /api/credits - current balance and plan.
pub async fn get_credits(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CreditsResponseDto>, ApiError> {
    let entitlement = state.entitlements.entitlement(&user.id).await?;

    // No profile row yet: report the fail-closed view.
    let response = match entitlement {
        Some(entitlement) => CreditsResponseDto {
            credits: entitlement.credits,
            plan: entitlement.plan.as_str().to_string(),
            subscription_status: entitlement
                .subscription_status
                .map(|s| s.as_str().to_string()),
        },
        None => CreditsResponseDto {
            credits: 0,
            plan: PlanTier::Free.as_str().to_string(),
            subscription_status: None,
        },
    };

    Ok(Json(response))
}
