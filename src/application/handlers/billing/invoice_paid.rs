//! Handler for `invoice.payment_succeeded`.
//!
//! Renewal invoices refresh the subscriber's monthly credit allotment and
//! mark the subscription active again. The initial invoice of a new
//! subscription is acknowledged without a grant; `checkout.session.completed`
//! already granted the first month.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::billing::{StripeEvent, StripeEventType, WebhookError, WebhookEventHandler};
use crate::ports::EntitlementStore;

/// Invoice fields the reconciler reads.
#[derive(Debug, Deserialize)]
struct InvoiceObject {
    id: String,
    #[serde(default)]
    subscription: Option<String>,
    #[serde(default)]
    billing_reason: Option<String>,
}

/// Re-grants monthly credits on paid renewal invoices.
pub struct InvoicePaidHandler {
    entitlements: Arc<dyn EntitlementStore>,
}

impl InvoicePaidHandler {
    pub fn new(entitlements: Arc<dyn EntitlementStore>) -> Self {
        Self { entitlements }
    }
}

#[async_trait]
impl WebhookEventHandler for InvoicePaidHandler {
    fn handles(&self) -> Vec<StripeEventType> {
        vec![StripeEventType::InvoicePaymentSucceeded]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let invoice: InvoiceObject = event.deserialize_object()?;

        let Some(subscription_id) = invoice.subscription else {
            return Err(WebhookError::Ignored(format!(
                "invoice {} is not tied to a subscription",
                invoice.id
            )));
        };

        if invoice.billing_reason.as_deref() == Some("subscription_create") {
            return Err(WebhookError::Ignored(
                "initial invoice; first grant handled at checkout completion".to_string(),
            ));
        }

        // Unknown subscription is retryable: the checkout completion event
        // that creates the row may still be in flight.
        let user_id = self
            .entitlements
            .find_subscription_user(&subscription_id)
            .await?
            .ok_or(WebhookError::SubscriptionNotFound)?;

        self.entitlements
            .mark_subscription_active(&subscription_id)
            .await?;

        let entitlement = self
            .entitlements
            .entitlement(&user_id)
            .await?
            .ok_or(WebhookError::SubscriptionNotFound)?;

        let credits = entitlement.plan.monthly_credits();
        if credits == 0 {
            return Err(WebhookError::Ignored(format!(
                "user {user_id} is on a plan with no monthly allotment"
            )));
        }

        self.entitlements.grant_credits(&user_id, credits).await?;

        tracing::info!(
            user_id = %user_id,
            credits,
            invoice_id = %invoice.id,
            "Renewed monthly credit allotment"
        );

        Ok(())
    }
}
