//! PaymentGateway port - hosted checkout session creation.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::billing::PurchaseIntent;
use crate::domain::foundation::UserId;

/// Everything the gateway needs to build a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub user_id: UserId,
    pub intent: PurchaseIntent,
    pub success_url: String,
    pub cancel_url: String,
}

/// Created session; clients redirect to `url`.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment provider request failed: {0}")]
    RequestFailed(String),
    #[error("payment provider rejected the request: {0}")]
    Rejected(String),
    #[error("payment provider returned malformed output: {0}")]
    MalformedResponse(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError>;
}
