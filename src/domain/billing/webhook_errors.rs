//! Error types for Stripe webhook handling.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur during webhook verification and processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Event timestamp is outside the acceptable window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Failed to parse the signature header or JSON payload.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required metadata field missing from the event's session object.
    #[error("Missing metadata: {0}")]
    MissingMetadata(&'static str),

    /// Required field missing from the event payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// No subscription record matches the event's subscription id.
    #[error("Subscription not found")]
    SubscriptionNotFound,

    /// Event was intentionally ignored (acknowledged, not an error).
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// Store mutation failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Whether Stripe should retry delivering this event.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            // SubscriptionNotFound may be eventual consistency with the
            // checkout.session.completed event still in flight.
            WebhookError::Database(_) | WebhookError::SubscriptionNotFound
        )
    }

    /// HTTP status returned to Stripe; non-2xx triggers redelivery.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature | WebhookError::TimestampOutOfRange => {
                StatusCode::BAD_REQUEST
            }
            WebhookError::ParseError(_)
            | WebhookError::MissingMetadata(_)
            | WebhookError::MissingField(_) => StatusCode::BAD_REQUEST,
            WebhookError::Ignored(_) => StatusCode::OK,
            WebhookError::SubscriptionNotFound | WebhookError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<crate::domain::foundation::DomainError> for WebhookError {
    fn from(err: crate::domain::foundation::DomainError) -> Self {
        WebhookError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::ParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_signature_returns_400_and_no_retry() {
        let err = WebhookError::InvalidSignature;
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_retryable());
    }

    #[test]
    fn database_error_returns_500_and_retries() {
        let err = WebhookError::Database("connection reset".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_retryable());
    }

    #[test]
    fn missing_metadata_returns_400() {
        let err = WebhookError::MissingMetadata("user_id");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_retryable());
    }

    #[test]
    fn ignored_is_acknowledged_as_200() {
        let err = WebhookError::Ignored("unhandled event type".to_string());
        assert_eq!(err.status_code(), StatusCode::OK);
        assert!(!err.is_retryable());
    }

    #[test]
    fn subscription_not_found_is_retryable() {
        assert!(WebhookError::SubscriptionNotFound.is_retryable());
    }

    #[test]
    fn malformed_event_object_maps_to_parse_error() {
        let err: WebhookError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, WebhookError::ParseError(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
