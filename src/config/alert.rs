//! Operator alert configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Operator alert configuration
///
/// When `webhook_url` is unset, alerts fall back to log lines only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertConfig {
    /// Webhook URL to POST capacity alerts to (Slack-compatible payload)
    pub webhook_url: Option<String>,
}

impl AlertConfig {
    /// Check if a webhook target is configured
    pub fn has_webhook(&self) -> bool {
        self.webhook_url.as_ref().is_some_and(|u| !u.is_empty())
    }

    /// Validate alert configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = &self.webhook_url {
            if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidAlertWebhookUrl);
            }
        }
        Ok(())
    }
}
