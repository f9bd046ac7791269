//! PostgreSQL adapters.

mod entitlement_store;
mod result_store;
mod webhook_event_repository;

pub use entitlement_store::PostgresEntitlementStore;
pub use result_store::PostgresResultStore;
pub use webhook_event_repository::PostgresWebhookEventRepository;
