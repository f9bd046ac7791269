//! Integration tests for Stripe webhook reconciliation.
//!
//! These tests verify the end-to-end flow:
//! 1. Signature verification gates every payload
//! 2. Verified events dispatch to the registered handlers
//! 3. Entitlement changes land exactly once per event id
//! 4. Redeliveries and unknown event types are acknowledged safely
//!
//! Uses in-memory implementations to test the flow without external
//! dependencies.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use notarobot::application::handlers::billing::{
    CheckoutCompletedHandler, InvoicePaidHandler, SubscriptionDeletedHandler,
};
use notarobot::domain::billing::{
    sign_payload, HandlerRegistry, StripeWebhookVerifier, WebhookError, WebhookProcessor,
};
use notarobot::domain::credits::{PlanTier, SubscriptionStatus};
use notarobot::domain::foundation::{DomainError, UserId};
use notarobot::ports::{
    CreditPurchase, DebitOutcome, Entitlement, EntitlementStore, SaveResult,
    SubscriptionRecord, WebhookEventRecord, WebhookEventRepository, WebhookOutcome,
};

const SIGNING_SECRET: &str = "whsec_integration_secret";
const USER: &str = "5e0a9c70-0000-4000-8000-00000000aaaa";

// =============================================================================
// Test Infrastructure
// =============================================================================

#[derive(Default)]
struct LedgerState {
    balances: HashMap<String, i64>,
    plans: HashMap<String, PlanTier>,
    subscriptions: HashMap<String, (String, SubscriptionStatus)>,
    purchases: Vec<CreditPurchase>,
}

/// In-memory entitlement store backing the reconciliation handlers.
#[derive(Default)]
struct InMemoryLedger {
    state: Mutex<LedgerState>,
    fail_next_purchase: AtomicBool,
}

impl InMemoryLedger {
    fn fail_next_purchase(&self) {
        self.fail_next_purchase.store(true, Ordering::SeqCst);
    }

    fn balance(&self, user_id: &str) -> i64 {
        *self
            .state
            .lock()
            .unwrap()
            .balances
            .get(user_id)
            .unwrap_or(&0)
    }

    fn plan(&self, user_id: &str) -> PlanTier {
        *self
            .state
            .lock()
            .unwrap()
            .plans
            .get(user_id)
            .unwrap_or(&PlanTier::Free)
    }

    fn purchase_count(&self) -> usize {
        self.state.lock().unwrap().purchases.len()
    }

    fn subscription_status(&self, stripe_subscription_id: &str) -> Option<SubscriptionStatus> {
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .get(stripe_subscription_id)
            .map(|(_, status)| *status)
    }
}

#[async_trait]
impl EntitlementStore for InMemoryLedger {
    async fn credit_balance(&self, user_id: &UserId) -> Result<Option<i64>, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .balances
            .get(user_id.as_str())
            .copied())
    }

    async fn entitlement(&self, user_id: &UserId) -> Result<Option<Entitlement>, DomainError> {
        let state = self.state.lock().unwrap();
        let Some(credits) = state.balances.get(user_id.as_str()).copied() else {
            return Ok(None);
        };
        Ok(Some(Entitlement {
            user_id: user_id.clone(),
            credits,
            plan: state
                .plans
                .get(user_id.as_str())
                .copied()
                .unwrap_or(PlanTier::Free),
            subscription_status: None,
        }))
    }

    async fn debit_credits(
        &self,
        user_id: &UserId,
        amount: u32,
    ) -> Result<DebitOutcome, DomainError> {
        let mut state = self.state.lock().unwrap();
        let balance = state.balances.entry(user_id.to_string()).or_insert(0);
        if *balance < i64::from(amount) {
            return Ok(DebitOutcome::InsufficientCredits { available: *balance });
        }
        *balance -= i64::from(amount);
        Ok(DebitOutcome::Debited { remaining: *balance })
    }

    async fn grant_credits(&self, user_id: &UserId, amount: u32) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        *state.balances.entry(user_id.to_string()).or_insert(0) += i64::from(amount);
        Ok(())
    }

    async fn apply_credit_purchase(&self, purchase: CreditPurchase) -> Result<(), DomainError> {
        if self.fail_next_purchase.swap(false, Ordering::SeqCst) {
            return Err(DomainError::database("connection reset"));
        }
        // Grant and purchase row land together, as in the transactional
        // store.
        let mut state = self.state.lock().unwrap();
        *state
            .balances
            .entry(purchase.user_id.to_string())
            .or_insert(0) += i64::from(purchase.credits);
        state.purchases.push(purchase);
        Ok(())
    }

    async fn upsert_subscription(&self, record: SubscriptionRecord) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        state.subscriptions.insert(
            record.stripe_subscription_id.clone(),
            (record.user_id.to_string(), record.status),
        );
        state.plans.insert(record.user_id.to_string(), record.plan);
        Ok(())
    }

    async fn find_subscription_user(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<UserId>, DomainError> {
        let state = self.state.lock().unwrap();
        match state.subscriptions.get(stripe_subscription_id) {
            Some((user, _)) => Ok(Some(UserId::new(user.clone())?)),
            None => Ok(None),
        }
    }

    async fn cancel_subscription(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<UserId>, DomainError> {
        let mut state = self.state.lock().unwrap();
        let Some((user, status)) = state.subscriptions.get_mut(stripe_subscription_id) else {
            return Ok(None);
        };
        *status = SubscriptionStatus::Canceled;
        let user = user.clone();
        state.plans.insert(user.clone(), PlanTier::Free);
        Ok(Some(UserId::new(user)?))
    }

    async fn mark_subscription_active(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        if let Some((_, status)) = state.subscriptions.get_mut(stripe_subscription_id) {
            *status = SubscriptionStatus::Active;
        }
        Ok(())
    }
}

/// In-memory event log with the same settle-or-retry semantics as the
/// database table: failed records may be overwritten, settled ones may not.
#[derive(Default)]
struct InMemoryEventLog {
    records: Mutex<HashMap<String, WebhookEventRecord>>,
}

impl InMemoryEventLog {
    fn result_for(&self, event_id: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .get(event_id)
            .map(|r| r.result.clone())
    }
}

#[async_trait]
impl WebhookEventRepository for InMemoryEventLog {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError> {
        Ok(self.records.lock().unwrap().get(event_id).cloned())
    }

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
        let mut records = self.records.lock().unwrap();
        match records.get(&record.event_id) {
            Some(existing) if !existing.is_failed() => Ok(SaveResult::AlreadyExists),
            _ => {
                records.insert(record.event_id.clone(), record);
                Ok(SaveResult::Inserted)
            }
        }
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|_, r| r.processed_at >= cutoff);
        Ok((before - records.len()) as u64)
    }
}

struct Pipeline {
    verifier: StripeWebhookVerifier,
    processor: WebhookProcessor,
    ledger: Arc<InMemoryLedger>,
    log: Arc<InMemoryEventLog>,
}

impl Pipeline {
    fn new() -> Self {
        let ledger = Arc::new(InMemoryLedger::default());
        let log = Arc::new(InMemoryEventLog::default());
        let registry = HandlerRegistry::new()
            .register(Arc::new(CheckoutCompletedHandler::new(ledger.clone())))
            .register(Arc::new(InvoicePaidHandler::new(ledger.clone())))
            .register(Arc::new(SubscriptionDeletedHandler::new(ledger.clone())));
        Self {
            verifier: StripeWebhookVerifier::new(SIGNING_SECRET),
            processor: WebhookProcessor::new(log.clone(), registry),
            ledger,
            log,
        }
    }

    /// Signs and delivers a payload the way the HTTP endpoint would.
    async fn deliver(&self, payload: &str) -> Result<WebhookOutcome, WebhookError> {
        let header = sign_payload(
            SIGNING_SECRET,
            chrono::Utc::now().timestamp(),
            payload.as_bytes(),
        );
        let event = self.verifier.verify_and_parse(payload.as_bytes(), &header)?;
        self.processor.process(event).await
    }
}

fn credits_checkout_payload(event_id: &str) -> String {
    serde_json::json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "created": chrono::Utc::now().timestamp(),
        "data": {
            "object": {
                "id": "cs_credits_1",
                "payment_intent": "pi_1",
                "amount_total": 999,
                "metadata": { "user_id": USER, "type": "credits", "credits": "100" }
            }
        },
        "livemode": false
    })
    .to_string()
}

fn subscription_checkout_payload(event_id: &str, subscription_id: &str) -> String {
    serde_json::json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "created": chrono::Utc::now().timestamp(),
        "data": {
            "object": {
                "id": "cs_sub_1",
                "customer": "cus_1",
                "subscription": subscription_id,
                "metadata": { "user_id": USER, "type": "subscription", "plan": "pro" }
            }
        },
        "livemode": false
    })
    .to_string()
}

fn subscription_deleted_payload(event_id: &str, subscription_id: &str) -> String {
    serde_json::json!({
        "id": event_id,
        "type": "customer.subscription.deleted",
        "created": chrono::Utc::now().timestamp(),
        "data": { "object": { "id": subscription_id, "status": "canceled" } },
        "livemode": false
    })
    .to_string()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn signed_credit_purchase_grants_exactly_once() {
    let pipeline = Pipeline::new();

    let outcome = pipeline
        .deliver(&credits_checkout_payload("evt_credits_1"))
        .await
        .unwrap();

    assert_eq!(outcome, WebhookOutcome::Processed);
    assert_eq!(pipeline.ledger.balance(USER), 100);
    assert_eq!(pipeline.ledger.purchase_count(), 1);
    assert_eq!(
        pipeline.log.result_for("evt_credits_1").as_deref(),
        Some("success")
    );
}

#[tokio::test]
async fn redelivery_after_transient_failure_converges_on_one_grant() {
    let pipeline = Pipeline::new();
    let payload = credits_checkout_payload("evt_credits_retry");

    pipeline.ledger.fail_next_purchase();
    let first = pipeline.deliver(&payload).await;

    // The failure surfaces as a retryable non-2xx and leaves no grant.
    assert!(matches!(first, Err(WebhookError::Database(_))));
    assert_eq!(pipeline.ledger.balance(USER), 0);
    assert_eq!(
        pipeline.log.result_for("evt_credits_retry").as_deref(),
        Some("failed")
    );

    let second = pipeline.deliver(&payload).await.unwrap();

    assert_eq!(second, WebhookOutcome::Processed);
    assert_eq!(pipeline.ledger.balance(USER), 100);
    assert_eq!(pipeline.ledger.purchase_count(), 1);
    assert_eq!(
        pipeline.log.result_for("evt_credits_retry").as_deref(),
        Some("success")
    );
}

#[tokio::test]
async fn redelivered_event_is_acknowledged_without_second_grant() {
    let pipeline = Pipeline::new();
    let payload = credits_checkout_payload("evt_credits_dup");

    let first = pipeline.deliver(&payload).await.unwrap();
    let second = pipeline.deliver(&payload).await.unwrap();

    assert_eq!(first, WebhookOutcome::Processed);
    assert_eq!(second, WebhookOutcome::AlreadyProcessed);
    assert_eq!(pipeline.ledger.balance(USER), 100);
    assert_eq!(pipeline.ledger.purchase_count(), 1);
}

#[tokio::test]
async fn forged_signature_is_rejected_before_any_mutation() {
    let pipeline = Pipeline::new();
    let payload = credits_checkout_payload("evt_forged");
    let header = sign_payload(
        "whsec_wrong_secret",
        chrono::Utc::now().timestamp(),
        payload.as_bytes(),
    );

    let result = pipeline
        .verifier
        .verify_and_parse(payload.as_bytes(), &header);

    assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    assert_eq!(pipeline.ledger.balance(USER), 0);
    assert!(pipeline.log.result_for("evt_forged").is_none());
}

#[tokio::test]
async fn stale_signature_is_rejected() {
    let pipeline = Pipeline::new();
    let payload = credits_checkout_payload("evt_stale");
    let header = sign_payload(
        SIGNING_SECRET,
        chrono::Utc::now().timestamp() - 3600,
        payload.as_bytes(),
    );

    let result = pipeline
        .verifier
        .verify_and_parse(payload.as_bytes(), &header);

    assert!(matches!(result, Err(WebhookError::TimestampOutOfRange)));
    assert_eq!(pipeline.ledger.balance(USER), 0);
}

#[tokio::test]
async fn subscription_lifecycle_grants_then_reverts_to_free() {
    let pipeline = Pipeline::new();

    pipeline
        .deliver(&subscription_checkout_payload("evt_sub_checkout", "sub_1"))
        .await
        .unwrap();

    // Pro checkout: subscription active, first monthly grant applied.
    assert_eq!(pipeline.ledger.plan(USER), PlanTier::Pro);
    assert_eq!(pipeline.ledger.balance(USER), 200);
    assert_eq!(
        pipeline.ledger.subscription_status("sub_1"),
        Some(SubscriptionStatus::Active)
    );

    pipeline
        .deliver(&subscription_deleted_payload("evt_sub_deleted", "sub_1"))
        .await
        .unwrap();

    // Cancellation reverts the plan but leaves granted credits alone.
    assert_eq!(pipeline.ledger.plan(USER), PlanTier::Free);
    assert_eq!(pipeline.ledger.balance(USER), 200);
    assert_eq!(
        pipeline.ledger.subscription_status("sub_1"),
        Some(SubscriptionStatus::Canceled)
    );
}

#[tokio::test]
async fn renewal_invoice_grants_monthly_credits() {
    let pipeline = Pipeline::new();

    pipeline
        .deliver(&subscription_checkout_payload("evt_sub_checkout_2", "sub_2"))
        .await
        .unwrap();
    assert_eq!(pipeline.ledger.balance(USER), 200);

    let renewal = serde_json::json!({
        "id": "evt_invoice_renewal",
        "type": "invoice.payment_succeeded",
        "created": chrono::Utc::now().timestamp(),
        "data": {
            "object": {
                "id": "in_1",
                "subscription": "sub_2",
                "billing_reason": "subscription_cycle"
            }
        },
        "livemode": false
    })
    .to_string();

    let outcome = pipeline.deliver(&renewal).await.unwrap();

    assert_eq!(outcome, WebhookOutcome::Processed);
    assert_eq!(pipeline.ledger.balance(USER), 400);
}

#[tokio::test]
async fn first_invoice_after_checkout_does_not_double_grant() {
    let pipeline = Pipeline::new();

    pipeline
        .deliver(&subscription_checkout_payload("evt_sub_checkout_3", "sub_3"))
        .await
        .unwrap();

    let creation_invoice = serde_json::json!({
        "id": "evt_invoice_create",
        "type": "invoice.payment_succeeded",
        "created": chrono::Utc::now().timestamp(),
        "data": {
            "object": {
                "id": "in_2",
                "subscription": "sub_3",
                "billing_reason": "subscription_create"
            }
        },
        "livemode": false
    })
    .to_string();

    let outcome = pipeline.deliver(&creation_invoice).await.unwrap();

    // Acknowledged but not granted; checkout already applied the first month.
    assert_eq!(outcome, WebhookOutcome::Processed);
    assert_eq!(pipeline.ledger.balance(USER), 200);
}

#[tokio::test]
async fn unrecognized_event_type_is_acknowledged() {
    let pipeline = Pipeline::new();

    let payload = serde_json::json!({
        "id": "evt_refund",
        "type": "charge.refunded",
        "created": chrono::Utc::now().timestamp(),
        "data": { "object": { "id": "ch_1" } },
        "livemode": false
    })
    .to_string();

    let outcome = pipeline.deliver(&payload).await.unwrap();

    assert_eq!(outcome, WebhookOutcome::Processed);
    assert_eq!(
        pipeline.log.result_for("evt_refund").as_deref(),
        Some("ignored")
    );
}
