//! Request/response DTOs for the billing endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::billing::PurchaseIntent;
use crate::domain::credits::{CreditPackage, PlanTier};

use super::super::error::ApiError;

/// Body for POST /api/checkout.
///
/// Carries catalog identifiers only; amounts are resolved server-side.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequestDto {
    /// "subscription", "credits", or "photo_security".
    #[serde(rename = "type")]
    pub purchase_type: String,

    /// Plan id for subscriptions ("pro" or "enterprise").
    #[serde(default)]
    pub plan_id: Option<String>,

    /// Credit count for packs (must match a catalog package).
    #[serde(default)]
    pub credits: Option<u32>,

    /// Optional landing page override after checkout.
    #[serde(default)]
    pub return_url: Option<String>,
}

impl CheckoutRequestDto {
    /// Resolves the request into a catalog-validated purchase intent.
    pub fn to_intent(&self) -> Result<PurchaseIntent, ApiError> {
        match self.purchase_type.as_str() {
            "subscription" => {
                let plan_id = self
                    .plan_id
                    .as_deref()
                    .ok_or_else(|| ApiError::invalid_request("Missing plan_id"))?;
                let plan = PlanTier::from_plan_id(plan_id).ok_or_else(|| {
                    ApiError::invalid_request(format!("Unknown plan: {plan_id}"))
                })?;
                Ok(PurchaseIntent::Subscription { plan })
            }
            "credits" => {
                let credits = self
                    .credits
                    .ok_or_else(|| ApiError::invalid_request("Missing credits"))?;
                let package = CreditPackage::from_credits(credits).ok_or_else(|| {
                    ApiError::invalid_request(format!("Unknown credit package: {credits}"))
                })?;
                Ok(PurchaseIntent::Credits { package })
            }
            "photo_security" => Ok(PurchaseIntent::PhotoSecurity),
            other => Err(ApiError::invalid_request(format!(
                "Unknown purchase type: {other}"
            ))),
        }
    }
}

/// Response for POST /api/checkout.
#[derive(Debug, Serialize)]
pub struct CheckoutResponseDto {
    pub session_id: String,
    pub url: String,
}

/// Response for GET /api/credits.
#[derive(Debug, Serialize)]
pub struct CreditsResponseDto {
    pub credits: i64,
    pub plan: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_status: Option<String>,
}
