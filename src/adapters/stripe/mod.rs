//! Stripe adapter - hosted checkout session creation.

mod checkout;

pub use checkout::{StripeCheckoutAdapter, StripeCheckoutConfig};
