//! Foundation types shared across the domain.

mod errors;
mod ids;

pub use errors::{DomainError, ErrorCode};
pub use ids::UserId;
