//! Idempotent webhook event processing.
//!
//! Stripe retries delivery until it sees a 2xx, so every event can arrive
//! more than once. The processor records each event id before acknowledging;
//! the store's primary-key constraint decides races between concurrent
//! deliveries of the same event. A recorded failure does not settle the
//! event: the non-2xx response makes Stripe redeliver, and the retry runs
//! the handler again until the mutation lands.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookOutcome};

use super::stripe_event::{StripeEvent, StripeEventType};
use super::webhook_errors::WebhookError;

/// Handler for one or more Stripe event types.
#[async_trait]
pub trait WebhookEventHandler: Send + Sync {
    /// Event types this handler processes.
    fn handles(&self) -> Vec<StripeEventType>;

    /// Applies the entitlement change for the event.
    ///
    /// `Err(WebhookError::Ignored(_))` acknowledges without processing;
    /// other errors surface to Stripe and trigger redelivery.
    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError>;
}

/// Routes events to registered handlers by parsed type.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<StripeEventType, Arc<dyn WebhookEventHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for every event type it declares.
    pub fn register(mut self, handler: Arc<dyn WebhookEventHandler>) -> Self {
        for event_type in handler.handles() {
            self.handlers.insert(event_type, handler.clone());
        }
        self
    }

    async fn dispatch(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        match self.handlers.get(&event.parsed_type()) {
            Some(handler) => handler.handle(event).await,
            None => Err(WebhookError::Ignored(format!(
                "no handler for event type {}",
                event.event_type
            ))),
        }
    }
}

/// Entry point for verified webhook events.
pub struct WebhookProcessor {
    repository: Arc<dyn WebhookEventRepository>,
    registry: HandlerRegistry,
}

impl WebhookProcessor {
    pub fn new(repository: Arc<dyn WebhookEventRepository>, registry: HandlerRegistry) -> Self {
        Self {
            repository,
            registry,
        }
    }

    /// Processes one event at most once.
    ///
    /// Sequence: duplicate check, dispatch, record outcome. If a concurrent
    /// delivery wins the insert race the result is `AlreadyProcessed`. Only
    /// settled records (success or ignored) block redelivery; a failed
    /// record means the entitlement mutation never landed, so the retry
    /// dispatches again.
    pub async fn process(&self, event: StripeEvent) -> Result<WebhookOutcome, WebhookError> {
        match self.repository.find_by_event_id(&event.id).await? {
            Some(record) if !record.is_failed() => {
                return Ok(WebhookOutcome::AlreadyProcessed);
            }
            _ => {}
        }

        let result = self.registry.dispatch(&event).await;

        let payload = serde_json::to_value(&event)
            .map_err(|e| WebhookError::ParseError(format!("event not serializable: {e}")))?;
        let record = match &result {
            Ok(()) => WebhookEventRecord::success(&event.id, &event.event_type, payload),
            Err(WebhookError::Ignored(reason)) => {
                WebhookEventRecord::ignored(&event.id, &event.event_type, reason, payload)
            }
            Err(e) => {
                WebhookEventRecord::failed(&event.id, &event.event_type, e.to_string(), payload)
            }
        };

        match self.repository.save(record).await? {
            SaveResult::Inserted => match result {
                Ok(()) | Err(WebhookError::Ignored(_)) => Ok(WebhookOutcome::Processed),
                Err(e) => Err(e),
            },
            SaveResult::AlreadyExists => Ok(WebhookOutcome::AlreadyProcessed),
        }
    }
}
