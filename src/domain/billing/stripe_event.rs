//! Stripe webhook event envelope.
//!
//! Only the fields the reconciler needs are captured; the polymorphic
//! `data.object` stays as raw JSON until a handler deserializes it.

use serde::{Deserialize, Serialize};

/// A verified Stripe webhook event.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Event id (`evt_...`), also the idempotency key.
    pub id: String,

    /// Event type string (e.g. "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Creation time, Unix seconds.
    pub created: i64,

    /// Event payload container.
    pub data: StripeEventData,

    /// Live vs test mode.
    #[serde(default)]
    pub livemode: bool,
}

/// Container for the event's object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

impl StripeEvent {
    /// Parses the event type into a known variant.
    pub fn parsed_type(&self) -> StripeEventType {
        StripeEventType::from_event_name(&self.event_type)
    }

    /// Deserializes `data.object` as the given type.
    pub fn deserialize_object<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.object.clone())
    }
}

/// Event types the reconciler recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StripeEventType {
    CheckoutSessionCompleted,
    InvoicePaymentSucceeded,
    CustomerSubscriptionDeleted,
    Unknown,
}

impl StripeEventType {
    pub fn from_event_name(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "invoice.payment_succeeded" => Self::InvoicePaymentSucceeded,
            "customer.subscription.deleted" => Self::CustomerSubscriptionDeleted,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::InvoicePaymentSucceeded => "invoice.payment_succeeded",
            Self::CustomerSubscriptionDeleted => "customer.subscription.deleted",
            Self::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
pub(crate) fn test_event(id: &str, event_type: &str, object: serde_json::Value) -> StripeEvent {
    StripeEvent {
        id: id.to_string(),
        event_type: event_type.to_string(),
        created: chrono::Utc::now().timestamp(),
        data: StripeEventData { object },
        livemode: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_minimal_event() {
        let json = r#"{
            "id": "evt_123",
            "type": "checkout.session.completed",
            "created": 1704067200,
            "data": { "object": { "id": "cs_1" } },
            "livemode": false
        }"#;

        let event: StripeEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.id, "evt_123");
        assert_eq!(
            event.parsed_type(),
            StripeEventType::CheckoutSessionCompleted
        );
        assert_eq!(event.data.object["id"], "cs_1");
    }

    #[test]
    fn livemode_defaults_to_false() {
        let json = r#"{
            "id": "evt_1",
            "type": "invoice.payment_succeeded",
            "created": 1704067200,
            "data": { "object": {} }
        }"#;
        let event: StripeEvent = serde_json::from_str(json).unwrap();
        assert!(!event.livemode);
    }

    #[test]
    fn unrecognized_type_parses_as_unknown() {
        let event = test_event("evt_x", "payment_intent.created", json!({}));
        assert_eq!(event.parsed_type(), StripeEventType::Unknown);
    }

    #[test]
    fn event_names_round_trip() {
        for ty in [
            StripeEventType::CheckoutSessionCompleted,
            StripeEventType::InvoicePaymentSucceeded,
            StripeEventType::CustomerSubscriptionDeleted,
        ] {
            assert_eq!(StripeEventType::from_event_name(ty.as_str()), ty);
        }
    }

    #[test]
    fn deserialize_object_to_typed_view() {
        #[derive(Deserialize)]
        struct SessionView {
            customer: String,
        }

        let event = test_event(
            "evt_s",
            "checkout.session.completed",
            json!({"customer": "cus_9"}),
        );
        let view: SessionView = event.deserialize_object().unwrap();
        assert_eq!(view.customer, "cus_9");
    }
}
