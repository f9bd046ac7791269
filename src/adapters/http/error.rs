//! HTTP error responses.
//!
//! Every error leaves the API as `{"error": {"code", "message"}}` with a
//! status derived from the domain error code. Provider and store failures are
//! logged server-side and surfaced as generic messages.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::application::handlers::analysis::AnalysisError;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::PaymentError;

/// API-facing error with an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ErrorCode::InvalidRequest,
            message,
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalError,
            message,
        )
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::InsufficientCredits | ErrorCode::VisitorLimitExceeded => StatusCode::FORBIDDEN,
        ErrorCode::ServiceOverloaded => StatusCode::TOO_MANY_REQUESTS,
        ErrorCode::InvalidSignature => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::AnalysisFailed | ErrorCode::DatabaseError | ErrorCode::InternalError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let status = status_for(err.code);
        // Infrastructure detail stays in the logs.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(code = %err.code, error = %err.message, "Internal error");
            "Internal server error".to_string()
        } else {
            err.message
        };
        Self::new(status, err.code, message)
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::InsufficientCredits {
                required,
                available,
            } => Self::new(
                StatusCode::FORBIDDEN,
                ErrorCode::InsufficientCredits,
                format!("Insufficient credits: this analysis costs {required}, you have {available}"),
            ),
            AnalysisError::VisitorLimitExceeded { limit } => Self::new(
                StatusCode::FORBIDDEN,
                ErrorCode::VisitorLimitExceeded,
                format!("Visitor limit reached: {limit} free analyses used. Sign up to continue."),
            ),
            AnalysisError::Overloaded => Self::new(
                StatusCode::TOO_MANY_REQUESTS,
                ErrorCode::ServiceOverloaded,
                "Analysis service is overloaded, please try again shortly",
            ),
            AnalysisError::Failed(detail) => {
                tracing::error!(error = %detail, "Analysis provider failure");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::AnalysisFailed,
                    "Analysis failed, you were not charged",
                )
            }
            AnalysisError::Store(err) => err.into(),
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Rejected(message) => Self::invalid_request(message),
            PaymentError::RequestFailed(detail) | PaymentError::MalformedResponse(detail) => {
                tracing::error!(error = %detail, "Payment provider failure");
                Self::internal("Could not create checkout session")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": {
                    "code": self.code.to_string(),
                    "message": self.message,
                }
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_errors_map_to_forbidden() {
        let err: ApiError = AnalysisError::InsufficientCredits {
            required: 5,
            available: 2,
        }
        .into();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert!(err.message.contains("Insufficient credits"));

        let err: ApiError = AnalysisError::VisitorLimitExceeded { limit: 2 }.into();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert!(err.message.contains("Visitor limit reached"));
    }

    #[test]
    fn overload_maps_to_429() {
        let err: ApiError = AnalysisError::Overloaded.into();
        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn store_failure_hides_detail() {
        let err: ApiError = AnalysisError::Store(DomainError::database("connection refused")).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("connection refused"));
    }

    #[test]
    fn analysis_failure_tells_caller_not_charged() {
        let err: ApiError = AnalysisError::Failed("boom".to_string()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message.contains("not charged"));
    }
}
