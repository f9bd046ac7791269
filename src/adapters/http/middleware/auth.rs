//! Authentication middleware and extractors for axum.
//!
//! The middleware validates Bearer tokens through the `TokenVerifier` port
//! and injects `AuthenticatedUser` into request extensions. Handlers opt in
//! with `RequireAuth` (401 when absent) or `OptionalAuth` (anonymous callers
//! fall back to the visitor quota).

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::ports::{AuthError, AuthenticatedUser, TokenVerifier};

/// Auth middleware state - wraps the token verifier.
pub type AuthState = Arc<dyn TokenVerifier>;

/// Validates Bearer tokens and injects the user into request extensions.
///
/// A missing Authorization header continues without auth so visitor routes
/// still work; a present but invalid token is rejected with 401.
pub async fn auth_middleware(
    State(verifier): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match token {
        Some(token) => match verifier.verify(token) {
            Ok(user) => {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
            Err(e) => {
                let (status, message) = match &e {
                    AuthError::Expired => (StatusCode::UNAUTHORIZED, "Token expired"),
                    AuthError::Invalid => (StatusCode::UNAUTHORIZED, "Invalid token"),
                    AuthError::Misconfigured(msg) => {
                        tracing::error!("Token verification misconfigured: {}", msg);
                        (StatusCode::INTERNAL_SERVER_ERROR, "Authentication unavailable")
                    }
                };

                (
                    status,
                    Json(serde_json::json!({
                        "error": { "code": "UNAUTHORIZED", "message": message }
                    })),
                )
                    .into_response()
            }
        },
        None => next.run(request).await,
    }
}

/// Extractor that requires authentication.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthenticatedUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(RequireAuth)
            .ok_or(AuthRejection::Unauthenticated)
    }
}

/// Extractor for optional authentication.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(
            parts.extensions.get::<AuthenticatedUser>().cloned(),
        ))
    }
}

/// Rejection type for authentication failures.
#[derive(Debug, Clone)]
pub enum AuthRejection {
    Unauthenticated,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthRejection::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "Authentication required")
            }
        };

        (
            status,
            Json(serde_json::json!({
                "error": { "code": "UNAUTHORIZED", "message": message }
            })),
        )
            .into_response()
    }
}
