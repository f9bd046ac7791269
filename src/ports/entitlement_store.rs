//! EntitlementStore port - persisted credit balances, purchases, and
//! subscriptions.
//!
//! The credit balance is the only shared mutable resource in the system. Its
//! legitimate mutators are the deduction commit (analysis pipeline) and the
//! grant/revert operations (entitlement reconciler); both must be atomic,
//! store-enforced updates, never read-modify-write in handler code.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::credits::{PlanTier, SubscriptionStatus};
use crate::domain::foundation::{DomainError, UserId};

/// Result of an atomic conditional debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    /// Balance was at least the cost; it is now `remaining`.
    Debited { remaining: i64 },
    /// Balance was below the cost; nothing changed.
    InsufficientCredits { available: i64 },
}

/// A user's entitlement snapshot.
#[derive(Debug, Clone)]
pub struct Entitlement {
    pub user_id: UserId,
    pub credits: i64,
    pub plan: PlanTier,
    pub subscription_status: Option<SubscriptionStatus>,
}

/// Append-only record of a completed one-time purchase.
#[derive(Debug, Clone)]
pub struct CreditPurchase {
    pub user_id: UserId,
    pub credits: u32,
    pub amount_cents: i64,
    /// Stripe payment intent id (`pi_...`).
    pub payment_intent_id: Option<String>,
    pub status: PurchaseStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseStatus {
    Completed,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Completed => "completed",
        }
    }
}

/// Subscription record tied to the payment processor's ids.
#[derive(Debug, Clone)]
pub struct SubscriptionRecord {
    pub user_id: UserId,
    pub stripe_customer_id: String,
    pub stripe_subscription_id: String,
    pub plan: PlanTier,
    pub status: SubscriptionStatus,
}

/// Port over the profiles/credit_purchases/subscriptions tables.
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    /// Reads the current credit balance.
    ///
    /// `None` means no profile row exists yet (signup trigger race); callers
    /// must treat it as zero credits - fail closed, never open.
    async fn credit_balance(&self, user_id: &UserId) -> Result<Option<i64>, DomainError>;

    /// Full entitlement snapshot for the balance endpoint.
    async fn entitlement(&self, user_id: &UserId) -> Result<Option<Entitlement>, DomainError>;

    /// Atomically decrements the balance by `amount` iff balance >= amount.
    ///
    /// Single server-side arithmetic update; this is what closes the
    /// check/commit race between concurrent requests.
    async fn debit_credits(
        &self,
        user_id: &UserId,
        amount: u32,
    ) -> Result<DebitOutcome, DomainError>;

    /// Atomically adds `amount` credits to the balance.
    async fn grant_credits(&self, user_id: &UserId, amount: u32) -> Result<(), DomainError>;

    /// Grants `purchase.credits` and appends the purchase row in a single
    /// transaction.
    ///
    /// The two writes must commit together: the reconciler retries failed
    /// events, and a grant that lands without its purchase row would be
    /// granted again on redelivery.
    async fn apply_credit_purchase(&self, purchase: CreditPurchase) -> Result<(), DomainError>;

    /// Inserts or updates the subscription row keyed by the processor's
    /// subscription id, and mirrors plan/status onto the profile.
    async fn upsert_subscription(&self, record: SubscriptionRecord) -> Result<(), DomainError>;

    /// Looks up the owner of a processor subscription id.
    async fn find_subscription_user(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<UserId>, DomainError>;

    /// Marks a subscription canceled and reverts the owner's plan to free.
    /// Returns the owner, `None` if the subscription id is unknown.
    async fn cancel_subscription(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<UserId>, DomainError>;

    /// Marks a subscription active again (renewal invoice paid).
    async fn mark_subscription_active(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<(), DomainError>;
}

/// Best-effort store for analysis results shown in the user's history.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persists one analysis result. Failures are logged by callers and never
    /// fail the request.
    async fn save_result(&self, result: SavedResult) -> Result<(), DomainError>;
}

/// One persisted analysis result.
#[derive(Debug, Clone)]
pub struct SavedResult {
    pub user_id: UserId,
    pub service: &'static str,
    pub report: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
