//! Billing use-cases: checkout creation and webhook reconciliation.

mod checkout_completed;
mod create_checkout;
mod invoice_paid;
mod subscription_deleted;

pub use checkout_completed::CheckoutCompletedHandler;
pub use create_checkout::CheckoutService;
pub use invoice_paid::InvoicePaidHandler;
pub use subscription_deleted::SubscriptionDeletedHandler;
