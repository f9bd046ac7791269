//! Purchase intents and their checkout-session metadata encoding.
//!
//! The intent is embedded as opaque metadata on the checkout session so the
//! reconciler can attribute the completed payment without re-deriving it from
//! price ids.

use std::collections::HashMap;

use crate::domain::credits::{
    CreditPackage, PlanTier, PHOTO_SECURITY_CREDITS, PHOTO_SECURITY_PRICE_CENTS,
};
use crate::domain::foundation::UserId;

use super::webhook_errors::WebhookError;

/// What the user is buying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseIntent {
    /// Recurring subscription to a paid tier.
    Subscription { plan: PlanTier },
    /// One-time credit pack.
    Credits { package: CreditPackage },
    /// Flat-fee photo security add-on.
    PhotoSecurity,
}

impl PurchaseIntent {
    /// Credits granted when the payment completes. Subscriptions grant their
    /// monthly allotment; the reconciler re-grants it on every renewal.
    pub fn granted_credits(&self) -> u32 {
        match self {
            PurchaseIntent::Subscription { plan } => plan.monthly_credits(),
            PurchaseIntent::Credits { package } => package.credits(),
            PurchaseIntent::PhotoSecurity => PHOTO_SECURITY_CREDITS,
        }
    }

    /// Server-side one-time price, None for subscriptions (priced by the
    /// configured Stripe price id).
    pub fn one_time_price_cents(&self) -> Option<i64> {
        match self {
            PurchaseIntent::Subscription { .. } => None,
            PurchaseIntent::Credits { package } => Some(package.price_cents()),
            PurchaseIntent::PhotoSecurity => Some(PHOTO_SECURITY_PRICE_CENTS),
        }
    }

    /// Metadata `type` discriminator.
    pub fn type_str(&self) -> &'static str {
        match self {
            PurchaseIntent::Subscription { .. } => "subscription",
            PurchaseIntent::Credits { .. } => "credits",
            PurchaseIntent::PhotoSecurity => "photo_security",
        }
    }

    /// Encodes the intent plus the buyer into session metadata.
    pub fn to_metadata(&self, user_id: &UserId) -> HashMap<String, String> {
        let mut metadata = HashMap::new();
        metadata.insert("user_id".to_string(), user_id.to_string());
        metadata.insert("type".to_string(), self.type_str().to_string());
        match self {
            PurchaseIntent::Subscription { plan } => {
                metadata.insert("plan".to_string(), plan.as_str().to_string());
            }
            PurchaseIntent::Credits { package } => {
                metadata.insert("credits".to_string(), package.credits().to_string());
            }
            PurchaseIntent::PhotoSecurity => {}
        }
        metadata
    }

    /// Decodes an intent from session metadata on a completed checkout.
    pub fn from_metadata(metadata: &HashMap<String, String>) -> Result<Self, WebhookError> {
        match metadata.get("type").map(String::as_str) {
            Some("subscription") => {
                let plan_id = metadata
                    .get("plan")
                    .ok_or(WebhookError::MissingMetadata("plan"))?;
                let plan = PlanTier::from_plan_id(plan_id).ok_or_else(|| {
                    WebhookError::ParseError(format!("unknown plan in metadata: {plan_id}"))
                })?;
                Ok(PurchaseIntent::Subscription { plan })
            }
            Some("credits") => {
                let credits: u32 = metadata
                    .get("credits")
                    .ok_or(WebhookError::MissingMetadata("credits"))?
                    .parse()
                    .map_err(|_| {
                        WebhookError::ParseError("non-numeric credits metadata".to_string())
                    })?;
                let package = CreditPackage::from_credits(credits).ok_or_else(|| {
                    WebhookError::ParseError(format!("unknown credit package: {credits}"))
                })?;
                Ok(PurchaseIntent::Credits { package })
            }
            Some("photo_security") => Ok(PurchaseIntent::PhotoSecurity),
            Some(other) => Err(WebhookError::ParseError(format!(
                "unknown purchase type in metadata: {other}"
            ))),
            None => Err(WebhookError::MissingMetadata("type")),
        }
    }
}

/// Extracts the buyer's user id from session metadata.
pub fn user_id_from_metadata(
    metadata: &HashMap<String, String>,
) -> Result<UserId, WebhookError> {
    let raw = metadata
        .get("user_id")
        .ok_or(WebhookError::MissingMetadata("user_id"))?;
    UserId::new(raw.clone())
        .map_err(|_| WebhookError::ParseError("empty user_id metadata".to_string()))
}
