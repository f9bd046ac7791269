//! Stripe checkout session adapter.
//!
//! Implements `PaymentGateway` against Stripe's form-encoded REST API.
//! Prices are server-side only: one-time items carry inline `price_data`
//! amounts from the catalog, subscriptions reference configured price ids.
//! Client-supplied amounts never reach this adapter.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::billing::PurchaseIntent;
use crate::domain::credits::PlanTier;
use crate::ports::{CheckoutRequest, CheckoutSession, PaymentError, PaymentGateway};

/// Stripe checkout configuration.
#[derive(Clone)]
pub struct StripeCheckoutConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    /// Configured price id for the pro plan.
    pro_price_id: String,

    /// Configured price id for the enterprise plan.
    enterprise_price_id: String,
}

impl StripeCheckoutConfig {
    pub fn new(
        api_key: impl Into<String>,
        pro_price_id: impl Into<String>,
        enterprise_price_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: "https://api.stripe.com".to_string(),
            pro_price_id: pro_price_id.into(),
            enterprise_price_id: enterprise_price_id.into(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    fn price_id_for(&self, plan: PlanTier) -> Option<&str> {
        match plan {
            PlanTier::Pro => Some(&self.pro_price_id),
            PlanTier::Enterprise => Some(&self.enterprise_price_id),
            PlanTier::Free => None,
        }
    }
}

/// Stripe checkout session adapter.
pub struct StripeCheckoutAdapter {
    config: StripeCheckoutConfig,
    http_client: reqwest::Client,
}

/// Response shape from POST /v1/checkout/sessions.
#[derive(Debug, Deserialize)]
struct StripeSessionResponse {
    id: String,
    url: Option<String>,
}

impl StripeCheckoutAdapter {
    pub fn new(config: StripeCheckoutConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Builds the form parameters for one checkout session.
    fn session_params(&self, request: &CheckoutRequest) -> Result<Vec<(String, String)>, PaymentError> {
        let mut params = vec![
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
            (
                "client_reference_id".to_string(),
                request.user_id.to_string(),
            ),
        ];

        for (key, value) in request.intent.to_metadata(&request.user_id) {
            params.push((format!("metadata[{key}]"), value));
        }

        match &request.intent {
            PurchaseIntent::Subscription { plan } => {
                let price_id = self.config.price_id_for(*plan).ok_or_else(|| {
                    PaymentError::Rejected(format!(
                        "plan {} has no configured price",
                        plan.as_str()
                    ))
                })?;
                params.push(("mode".to_string(), "subscription".to_string()));
                params.push(("line_items[0][price]".to_string(), price_id.to_string()));
                params.push(("line_items[0][quantity]".to_string(), "1".to_string()));
            }
            intent @ (PurchaseIntent::Credits { .. } | PurchaseIntent::PhotoSecurity) => {
                // one_time_price_cents is Some for both one-time variants
                let amount = intent.one_time_price_cents().ok_or_else(|| {
                    PaymentError::Rejected("one-time purchase without a price".to_string())
                })?;
                params.push(("mode".to_string(), "payment".to_string()));
                params.push((
                    "line_items[0][price_data][currency]".to_string(),
                    "usd".to_string(),
                ));
                params.push((
                    "line_items[0][price_data][unit_amount]".to_string(),
                    amount.to_string(),
                ));
                params.push((
                    "line_items[0][price_data][product_data][name]".to_string(),
                    match intent {
                        PurchaseIntent::Credits { package } => {
                            format!("{} analysis credits", package.credits())
                        }
                        _ => "Photo security add-on".to_string(),
                    },
                ));
                params.push(("line_items[0][quantity]".to_string(), "1".to_string()));
            }
        }

        Ok(params)
    }
}

#[async_trait]
impl PaymentGateway for StripeCheckoutAdapter {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);
        let params = self.session_params(&request)?;

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, error = %error_text, "Stripe checkout session creation failed");
            if status.is_client_error() {
                return Err(PaymentError::Rejected(error_text));
            }
            return Err(PaymentError::RequestFailed(format!(
                "Stripe API error {status}: {error_text}"
            )));
        }

        let session: StripeSessionResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::MalformedResponse(e.to_string()))?;

        let session_url = session.url.ok_or_else(|| {
            PaymentError::MalformedResponse("checkout session has no redirect URL".to_string())
        })?;

        tracing::info!(session_id = %session.id, "Created Stripe checkout session");

        Ok(CheckoutSession {
            id: session.id,
            url: session_url,
        })
    }
}
