//! Ports - async trait boundaries between the domain and the outside world.

mod alert_notifier;
mod detection;
mod entitlement_store;
mod payment_gateway;
mod token_verifier;
mod webhook_event_repository;

pub use alert_notifier::AlertNotifier;
pub use detection::{
    AnalysisReport, DetectionError, Finding, ImageAnalysisRequest, TextAnalysisRequest,
    TextAnalyzer, TextSurface, VisionAnalyzer,
};
pub use entitlement_store::{
    CreditPurchase, DebitOutcome, Entitlement, EntitlementStore, PurchaseStatus, ResultStore,
    SavedResult, SubscriptionRecord,
};
pub use payment_gateway::{CheckoutRequest, CheckoutSession, PaymentError, PaymentGateway};
pub use token_verifier::{AuthError, AuthenticatedUser, TokenVerifier};
pub use webhook_event_repository::{
    SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookOutcome,
};
