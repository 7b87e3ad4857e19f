//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use strata_billing_engine::BillingError;
use strata_billing_store::StoreError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A mid-month billing period has no contiguous predecessor in the
    /// usage ledger. The operator must settle (or backfill) the preceding
    /// period before retrying; blind retries will not resolve it.
    #[error("missing previous usage for space {space} before {from}")]
    MissingPreviousUsage {
        /// Space whose usage chain is broken.
        space: String,
        /// Period start no ledger record ends at.
        from: DateTime<Utc>,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::MissingPreviousUsage { space, from } => (
                StatusCode::CONFLICT,
                "missing_previous_usage",
                self.to_string(),
                Some(serde_json::json!({
                    "space": space,
                    "from": from
                })),
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::InvalidPeriod { .. } => Self::BadRequest(err.to_string()),
            BillingError::MissingPreviousUsage { space, from, .. } => Self::MissingPreviousUsage {
                space: space.to_string(),
                from,
            },
            BillingError::SizeOutOfRange { .. } | BillingError::Store(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}
