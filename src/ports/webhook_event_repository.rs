//! WebhookEventRepository port - idempotency ledger for processed events.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::foundation::DomainError;

/// One processed webhook event, keyed by the provider's event id.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    pub event_id: String,
    pub event_type: String,
    pub processed_at: DateTime<Utc>,
    /// "success", "ignored", or "failed".
    pub result: String,
    pub error_message: Option<String>,
    pub payload: Value,
}

impl WebhookEventRecord {
    pub fn success(event_id: &str, event_type: &str, payload: Value) -> Self {
        Self {
            event_id: event_id.to_string(),
            event_type: event_type.to_string(),
            processed_at: Utc::now(),
            result: "success".to_string(),
            error_message: None,
            payload,
        }
    }

    pub fn ignored(event_id: &str, event_type: &str, reason: &str, payload: Value) -> Self {
        Self {
            event_id: event_id.to_string(),
            event_type: event_type.to_string(),
            processed_at: Utc::now(),
            result: "ignored".to_string(),
            error_message: Some(reason.to_string()),
            payload,
        }
    }

    pub fn failed(
        event_id: &str,
        event_type: &str,
        error: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            event_id: event_id.to_string(),
            event_type: event_type.to_string(),
            processed_at: Utc::now(),
            result: "failed".to_string(),
            error_message: Some(error.into()),
            payload,
        }
    }

    /// Whether this record marks a failed attempt that a redelivery may retry.
    pub fn is_failed(&self) -> bool {
        self.result == "failed"
    }
}

/// Whether `save` inserted a new row or hit an existing event id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    Inserted,
    AlreadyExists,
}

/// Outcome of processing one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Processed,
    AlreadyProcessed,
}

/// Port over the webhook_events table.
///
/// `save` must be conditional: insert if the event id is absent, replace an
/// existing `failed` record (a redelivery retrying the mutation), and report
/// `AlreadyExists` for a settled record. That constraint is what makes
/// concurrent redeliveries safe while still letting failed events converge.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError>;

    /// Prunes records older than `cutoff`. Returns rows deleted.
    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError>;
}
