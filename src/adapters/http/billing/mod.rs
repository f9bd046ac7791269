//! Billing endpoints.

mod dto;
mod handlers;
mod routes;

pub use routes::billing_router;
