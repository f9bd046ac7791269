//! Operator alert adapters.

mod webhook;

pub use webhook::{LogAlertNotifier, WebhookAlertNotifier};
