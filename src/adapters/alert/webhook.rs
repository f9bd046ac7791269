//! Operator alert notifiers.
//!
//! `WebhookAlertNotifier` POSTs a Slack-compatible payload to a configured
//! URL; `LogAlertNotifier` is the fallback when none is configured. Both are
//! fire-and-forget: a lost alert must never fail the request that raised it.

use async_trait::async_trait;
use serde_json::json;

use crate::ports::AlertNotifier;

/// Alert notifier that POSTs to a webhook URL.
pub struct WebhookAlertNotifier {
    webhook_url: String,
    client: reqwest::Client,
}

impl WebhookAlertNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AlertNotifier for WebhookAlertNotifier {
    async fn notify_overload(&self, service: &str, detail: &str) {
        let payload = json!({
            "text": format!("Analysis provider overloaded: service={service} detail={detail}"),
        });

        match self.client.post(&self.webhook_url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(service, "Sent overload alert");
            }
            Ok(response) => {
                tracing::warn!(service, status = %response.status(), "Overload alert rejected");
            }
            Err(e) => {
                tracing::warn!(service, error = %e, "Failed to send overload alert");
            }
        }
    }
}

/// Alert notifier that only logs.
#[derive(Default)]
pub struct LogAlertNotifier;

#[async_trait]
impl AlertNotifier for LogAlertNotifier {
    async fn notify_overload(&self, service: &str, detail: &str) {
        tracing::error!(service, detail, "Analysis provider overloaded");
    }
}
