//! Adapters - concrete implementations of the ports.

pub mod ai;
pub mod alert;
pub mod auth;
pub mod http;
pub mod postgres;
pub mod stripe;
