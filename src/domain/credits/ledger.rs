//! Quota ledger - pure decision logic over credit balances and visitor counters.
//!
//! The ledger only decides whether a billable operation may proceed. It never
//! mutates anything: the deduction commit happens after the inference call
//! succeeds, via an atomic conditional decrement at the store (authenticated)
//! or a response cookie bump (anonymous).

use serde::{Deserialize, Serialize};

use crate::domain::foundation::UserId;

use super::visitor::VisitorUsage;

/// Number of free analyses an anonymous visitor gets before being asked to
/// sign up. Advisory only - the counter lives in a client cookie.
pub const VISITOR_FREE_ANALYSES: u32 = 2;

/// The billable analysis services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    /// Resume sanitization (text, via chat completion).
    Resume,
    /// Essay authenticity check (text, via chat completion).
    Essay,
    /// Profile/bio analysis (text, via chat completion).
    Profile,
    /// Photo security analysis (image, via vision model).
    Photo,
}

impl ServiceKind {
    /// Credit cost of one analysis for this service.
    pub fn cost(&self) -> u32 {
        match self {
            ServiceKind::Photo => 5,
            ServiceKind::Resume | ServiceKind::Essay | ServiceKind::Profile => 1,
        }
    }

    /// Stable name used in logs and persisted result rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Resume => "resume",
            ServiceKind::Essay => "essay",
            ServiceKind::Profile => "profile",
            ServiceKind::Photo => "photo",
        }
    }
}

/// Who is asking for an analysis, with the quota state already resolved.
#[derive(Debug, Clone)]
pub enum Caller {
    /// Authenticated user with their persisted credit balance.
    ///
    /// A missing profile row resolves to balance 0 upstream - fails closed.
    User { id: UserId, balance: i64 },
    /// Anonymous visitor with the cookie-carried usage counter.
    Visitor { usage: VisitorUsage },
}

/// Outcome of a quota check. No side effects are implied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    /// The operation may proceed.
    Allowed,
    /// Authenticated caller does not have enough credits.
    InsufficientCredits { required: u32, available: i64 },
    /// Anonymous caller used up the free allowance.
    VisitorLimitExceeded { limit: u32 },
}

impl QuotaDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuotaDecision::Allowed)
    }
}

/// Decides whether a billable operation may proceed.
pub fn check(caller: &Caller, service: ServiceKind) -> QuotaDecision {
    let cost = service.cost();
    match caller {
        Caller::User { balance, .. } => {
            if *balance >= i64::from(cost) {
                QuotaDecision::Allowed
            } else {
                QuotaDecision::InsufficientCredits {
                    required: cost,
                    available: (*balance).max(0),
                }
            }
        }
        Caller::Visitor { usage } => {
            if usage.count() < VISITOR_FREE_ANALYSES {
                QuotaDecision::Allowed
            } else {
                QuotaDecision::VisitorLimitExceeded {
                    limit: VISITOR_FREE_ANALYSES,
                }
            }
        }
    }
}
