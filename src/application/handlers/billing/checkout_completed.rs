//! Handler for `checkout.session.completed`.
//!
//! Attributes the completed payment via session metadata and applies the
//! entitlement change: credit grants for one-time purchases, subscription
//! row plus the first monthly grant for plan purchases. Runs inside the
//! idempotent processor, so a redelivered event never grants twice.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::billing::{
    user_id_from_metadata, PurchaseIntent, StripeEvent, StripeEventType, WebhookError,
    WebhookEventHandler,
};
use crate::domain::credits::SubscriptionStatus;
use crate::ports::{CreditPurchase, EntitlementStore, PurchaseStatus, SubscriptionRecord};

/// Checkout session fields the reconciler reads.
#[derive(Debug, Deserialize)]
struct CheckoutSessionObject {
    id: String,
    #[serde(default)]
    customer: Option<String>,
    #[serde(default)]
    subscription: Option<String>,
    #[serde(default)]
    payment_intent: Option<String>,
    #[serde(default)]
    amount_total: Option<i64>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

/// Applies entitlements for completed checkouts.
pub struct CheckoutCompletedHandler {
    entitlements: Arc<dyn EntitlementStore>,
}

impl CheckoutCompletedHandler {
    pub fn new(entitlements: Arc<dyn EntitlementStore>) -> Self {
        Self { entitlements }
    }
}

#[async_trait]
impl WebhookEventHandler for CheckoutCompletedHandler {
    fn handles(&self) -> Vec<StripeEventType> {
        vec![StripeEventType::CheckoutSessionCompleted]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let session: CheckoutSessionObject = event.deserialize_object()?;
        let user_id = user_id_from_metadata(&session.metadata)?;
        let intent = PurchaseIntent::from_metadata(&session.metadata)?;

        match intent {
            PurchaseIntent::Credits { package } => {
                // Grant and purchase row commit together; a partial write
                // would double-grant when the event is redelivered.
                self.entitlements
                    .apply_credit_purchase(CreditPurchase {
                        user_id: user_id.clone(),
                        credits: package.credits(),
                        amount_cents: session.amount_total.unwrap_or(package.price_cents()),
                        payment_intent_id: session.payment_intent,
                        status: PurchaseStatus::Completed,
                    })
                    .await?;

                tracing::info!(
                    user_id = %user_id,
                    credits = package.credits(),
                    session_id = %session.id,
                    "Granted purchased credits"
                );
            }
            PurchaseIntent::PhotoSecurity => {
                self.entitlements
                    .apply_credit_purchase(CreditPurchase {
                        user_id: user_id.clone(),
                        credits: intent.granted_credits(),
                        amount_cents: session
                            .amount_total
                            .or(intent.one_time_price_cents())
                            .unwrap_or(0),
                        payment_intent_id: session.payment_intent,
                        status: PurchaseStatus::Completed,
                    })
                    .await?;

                tracing::info!(
                    user_id = %user_id,
                    session_id = %session.id,
                    "Granted photo security add-on"
                );
            }
            PurchaseIntent::Subscription { plan } => {
                let customer = session
                    .customer
                    .ok_or(WebhookError::MissingField("customer"))?;
                let subscription = session
                    .subscription
                    .ok_or(WebhookError::MissingField("subscription"))?;

                self.entitlements
                    .upsert_subscription(SubscriptionRecord {
                        user_id: user_id.clone(),
                        stripe_customer_id: customer,
                        stripe_subscription_id: subscription,
                        plan,
                        status: SubscriptionStatus::Active,
                    })
                    .await?;
                self.entitlements
                    .grant_credits(&user_id, plan.monthly_credits())
                    .await?;

                tracing::info!(
                    user_id = %user_id,
                    plan = plan.as_str(),
                    session_id = %session.id,
                    "Activated subscription with first monthly grant"
                );
            }
        }

        Ok(())
    }
}
