//! Billing domain: Stripe events, signature verification, idempotent
//! processing, and purchase intents.

mod intent;
mod stripe_event;
mod webhook_errors;
mod webhook_processor;
mod webhook_verifier;

pub use intent::{user_id_from_metadata, PurchaseIntent};
pub use stripe_event::{StripeEvent, StripeEventData, StripeEventType};
pub use webhook_errors::WebhookError;
pub use webhook_processor::{HandlerRegistry, WebhookEventHandler, WebhookProcessor};
pub use webhook_verifier::{sign_payload, StripeWebhookVerifier};
