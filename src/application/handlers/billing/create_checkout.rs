//! Checkout session creation.
//!
//! Translates a purchase intent into a gateway session. Prices never come
//! from the client: the intent carries only catalog identifiers and the
//! gateway resolves amounts server-side.

use std::sync::Arc;

use crate::domain::billing::PurchaseIntent;
use crate::domain::foundation::UserId;
use crate::ports::{CheckoutRequest, CheckoutSession, PaymentError, PaymentGateway};

/// Creates hosted checkout sessions.
pub struct CheckoutService {
    gateway: Arc<dyn PaymentGateway>,
    default_return_url: String,
}

impl CheckoutService {
    pub fn new(gateway: Arc<dyn PaymentGateway>, default_return_url: impl Into<String>) -> Self {
        Self {
            gateway,
            default_return_url: default_return_url.into(),
        }
    }

    /// Creates a checkout session for the given intent.
    ///
    /// `return_url` overrides the configured default landing page.
    pub async fn create(
        &self,
        user_id: UserId,
        intent: PurchaseIntent,
        return_url: Option<String>,
    ) -> Result<CheckoutSession, PaymentError> {
        let base = return_url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.default_return_url.clone());

        let separator = if base.contains('?') { '&' } else { '?' };
        let request = CheckoutRequest {
            user_id,
            intent,
            success_url: format!("{base}{separator}checkout=success"),
            cancel_url: format!("{base}{separator}checkout=canceled"),
        };

        let session = self.gateway.create_checkout_session(request).await?;

        tracing::info!(
            session_id = %session.id,
            purchase_type = intent.type_str(),
            "Checkout session created"
        );

        Ok(session)
    }
}
