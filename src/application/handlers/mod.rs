//! Use-case handlers.

pub mod analysis;
pub mod billing;
