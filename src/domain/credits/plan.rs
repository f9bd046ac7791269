//! Subscription tiers and credit packages.
//!
//! Both are fixed enumerations: the checkout builder validates client input
//! against them and never trusts client-supplied amounts.

use serde::{Deserialize, Serialize};

/// Subscription tier on a user's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Pro,
    Enterprise,
}

impl PlanTier {
    /// Parses a client-supplied plan id. Only paid tiers are purchasable.
    pub fn from_plan_id(id: &str) -> Option<Self> {
        match id {
            "pro" => Some(PlanTier::Pro),
            "enterprise" => Some(PlanTier::Enterprise),
            _ => None,
        }
    }

    /// Monthly credit allotment granted on activation and each renewal.
    pub fn monthly_credits(&self) -> u32 {
        match self {
            PlanTier::Free => 0,
            PlanTier::Pro => 200,
            PlanTier::Enterprise => 1000,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Pro => "pro",
            PlanTier::Enterprise => "enterprise",
        }
    }
}

/// Status of a subscription record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Canceled => "canceled",
        }
    }
}

/// One-time credit packages available for purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditPackage {
    Small,
    Medium,
    Large,
}

impl CreditPackage {
    /// Resolves a client-requested package size to a known package.
    pub fn from_credits(credits: u32) -> Option<Self> {
        match credits {
            50 => Some(CreditPackage::Small),
            100 => Some(CreditPackage::Medium),
            250 => Some(CreditPackage::Large),
            _ => None,
        }
    }

    /// Credits granted when the purchase completes.
    pub fn credits(&self) -> u32 {
        match self {
            CreditPackage::Small => 50,
            CreditPackage::Medium => 100,
            CreditPackage::Large => 250,
        }
    }

    /// Server-side price in cents.
    pub fn price_cents(&self) -> i64 {
        match self {
            CreditPackage::Small => 499,
            CreditPackage::Medium => 999,
            CreditPackage::Large => 1999,
        }
    }
}

/// Credits granted by the flat-fee photo security add-on.
pub const PHOTO_SECURITY_CREDITS: u32 = 25;

/// Server-side price of the photo security add-on, in cents.
pub const PHOTO_SECURITY_PRICE_CENTS: i64 = 1499;
