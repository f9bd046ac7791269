//! NotARobot - AI-content-detection API backend
//!
//! This crate implements the usage-gated analysis endpoints, the credit
//! ledger, checkout session creation, and Stripe webhook entitlement
//! reconciliation behind the NotARobot web application.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
