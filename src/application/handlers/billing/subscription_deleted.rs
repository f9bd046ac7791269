//! Handler for `customer.subscription.deleted`.
//!
//! Marks the subscription canceled and reverts the owner to the free plan.
//! Already-granted credits for the current period are left alone.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::billing::{StripeEvent, StripeEventType, WebhookError, WebhookEventHandler};
use crate::ports::EntitlementStore;

/// Subscription fields the reconciler reads.
#[derive(Debug, Deserialize)]
struct SubscriptionObject {
    id: String,
}

/// Reverts entitlements when a subscription ends.
pub struct SubscriptionDeletedHandler {
    entitlements: Arc<dyn EntitlementStore>,
}

impl SubscriptionDeletedHandler {
    pub fn new(entitlements: Arc<dyn EntitlementStore>) -> Self {
        Self { entitlements }
    }
}

#[async_trait]
impl WebhookEventHandler for SubscriptionDeletedHandler {
    fn handles(&self) -> Vec<StripeEventType> {
        vec![StripeEventType::CustomerSubscriptionDeleted]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let subscription: SubscriptionObject = event.deserialize_object()?;

        match self
            .entitlements
            .cancel_subscription(&subscription.id)
            .await?
        {
            Some(user_id) => {
                tracing::info!(
                    user_id = %user_id,
                    subscription_id = %subscription.id,
                    "Subscription canceled; plan reverted to free"
                );
                Ok(())
            }
            // Nothing to revert; acknowledge so Stripe stops retrying.
            None => Err(WebhookError::Ignored(format!(
                "unknown subscription {}",
                subscription.id
            ))),
        }
    }
}
