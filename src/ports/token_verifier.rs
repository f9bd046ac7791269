//! TokenVerifier port - bearer token verification for authenticated routes.

use thiserror::Error;

use crate::domain::foundation::UserId;

/// Identity extracted from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub email: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token expired")]
    Expired,
    #[error("token invalid")]
    Invalid,
    #[error("token verification misconfigured: {0}")]
    Misconfigured(String),
}

/// Verifies a bearer token and yields the caller's identity.
///
/// Sync on purpose; HMAC verification does no I/O and extractors call it
/// inline.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
