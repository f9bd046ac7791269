//! Domain layer - pure business logic, no I/O.

pub mod billing;
pub mod credits;
pub mod foundation;
