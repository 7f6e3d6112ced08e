//! API error handling
//!
//! | Error | Status |
//! |---|---|
//! | missing or bad token | 401 |
//! | role does not allow the operation | 403 |
//! | unknown claim or invoice | 404 |
//! | stale edit, illegal status change | 409 |
//! | field validation | 422 |
//! | malformed request | 400 |
//! | anything else | 500 |

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use core_kernel::PortError;
use domain_claims::attachment::ATTACHMENT_FIELD;
use domain_claims::{ClaimError, FieldError};

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {message}")]
    Validation {
        field: Option<String>,
        message: String,
    },
}

impl ApiError {
    /// Validation failure attributed to a form field
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Form field the error refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            ApiError::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
        };

        let (message, field) = match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Forbidden(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg) => (msg, None),
            ApiError::Unauthorized => ("Unauthorized".to_string(), None),
            ApiError::Validation { field, message } => (message, field),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            field,
        };

        (status, Json(body)).into_response()
    }
}

impl From<FieldError> for ApiError {
    fn from(err: FieldError) -> Self {
        ApiError::field(err.field, err.message)
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::NotPermitted { .. } => ApiError::Forbidden(err.to_string()),
            ClaimError::ClaimNotFound(_) | ClaimError::InvoiceNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            ClaimError::Validation(field) => field.into(),
            ClaimError::ConcurrencyConflict(_) | ClaimError::InvalidStatusTransition { .. } => {
                ApiError::Conflict(err.to_string())
            }
            ClaimError::Store(port) => port.into(),
            ClaimError::UnknownStatus(_) => {
                error!(error = %err, "Corrupt claim data");
                ApiError::Internal("Internal server error".to_string())
            }
        }
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            PortError::Conflict { .. } => ApiError::Conflict(err.to_string()),
            PortError::Validation { message, field } => ApiError::Validation { field, message },
            PortError::Connection { .. } | PortError::Internal { .. } => {
                error!(error = ?err, "Store failure");
                ApiError::Internal("Internal server error".to_string())
            }
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let first = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("{field} is invalid"));
                (field.to_string(), message)
            });

        match first {
            Some((field, message)) => ApiError::field(field, message),
            None => ApiError::Validation {
                field: None,
                message: errors.to_string(),
            },
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::field(ATTACHMENT_FIELD, "File size exceeds limit")
        } else {
            ApiError::BadRequest(err.body_text())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::ClaimId;
    use domain_claims::Operation;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_claim_errors_map_to_statuses() {
        assert_eq!(
            status_of(ClaimError::NotPermitted {
                identity: "a@example.com".to_string(),
                operation: Operation::Approve,
            }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_of(ClaimError::ClaimNotFound(ClaimId::new(1))), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(ClaimError::ConcurrencyConflict(ClaimId::new(1))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ClaimError::Validation(FieldError::new("attachment", "too big"))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(ClaimError::Store(PortError::internal("boom"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
