//! HTTP middleware.

mod auth;

pub use auth::{auth_middleware, OptionalAuth, RequireAuth};
