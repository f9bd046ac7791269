//! Payment configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Payment configuration (Stripe)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Stripe API key
    pub stripe_api_key: String,

    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,

    /// Stripe price ID for the pro plan
    pub stripe_pro_price_id: String,

    /// Stripe price ID for the enterprise plan
    pub stripe_enterprise_price_id: String,

    /// Default URL users land on after checkout
    #[serde(default = "default_return_url")]
    pub default_return_url: String,

    /// Stripe API base URL (overridable for tests)
    #[serde(default = "default_stripe_base_url")]
    pub stripe_base_url: String,
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_live_")
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }

        // Verify key prefixes for safety
        if !self.stripe_api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        if !self.stripe_pro_price_id.starts_with("price_") {
            return Err(ValidationError::InvalidStripePriceId("STRIPE_PRO_PRICE_ID"));
        }
        if !self.stripe_enterprise_price_id.starts_with("price_") {
            return Err(ValidationError::InvalidStripePriceId(
                "STRIPE_ENTERPRISE_PRICE_ID",
            ));
        }

        Ok(())
    }
}

fn default_return_url() -> String {
    "http://localhost:5173/account".to_string()
}

fn default_stripe_base_url() -> String {
    "https://api.stripe.com".to_string()
}
