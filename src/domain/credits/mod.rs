//! Credit/quota domain: the quota ledger, visitor counter, and plan catalog.

pub mod ledger;
mod plan;
mod visitor;

pub use ledger::{check, Caller, QuotaDecision, ServiceKind, VISITOR_FREE_ANALYSES};
pub use plan::{
    CreditPackage, PlanTier, SubscriptionStatus, PHOTO_SECURITY_CREDITS,
    PHOTO_SECURITY_PRICE_CENTS,
};
pub use visitor::{VisitorUsage, VISITOR_COOKIE_MAX_AGE_SECS, VISITOR_COOKIE_NAME};
