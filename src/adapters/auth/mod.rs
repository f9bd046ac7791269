//! Authentication adapters.

mod jwt;

pub use jwt::SupabaseJwtVerifier;
