//! Supabase JWT verification adapter.
//!
//! Verifies HS256 tokens signed with the project's shared JWT secret. The
//! `sub` claim is the user id; `aud` must match the configured audience
//! ("authenticated" for Supabase user tokens).

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use crate::domain::foundation::UserId;
use crate::ports::{AuthError, AuthenticatedUser, TokenVerifier};

/// Claims we read from a Supabase access token.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    email: Option<String>,
}

/// HS256 token verifier for Supabase-issued JWTs.
pub struct SupabaseJwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SupabaseJwtVerifier {
    pub fn new(secret: Secret<String>, audience: &str) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.expose_secret().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);
        validation.validate_exp = true;

        Self {
            decoding_key,
            validation,
        }
    }
}

impl TokenVerifier for SupabaseJwtVerifier {
    fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid,
            }
        })?;

        let id = UserId::new(data.claims.sub).map_err(|_| AuthError::Invalid)?;

        Ok(AuthenticatedUser {
            id,
            email: data.claims.email,
        })
    }
}
