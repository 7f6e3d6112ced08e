//! Claims domain errors

use thiserror::Error;

use core_kernel::{ClaimId, PortError};
use crate::access::Operation;
use crate::attachment::{AttachmentError, ATTACHMENT_FIELD};
use crate::submission::FieldError;

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    /// The caller holds no role granting the operation
    #[error("{identity} is not permitted to {operation}")]
    NotPermitted { identity: String, operation: Operation },

    #[error("Claim not found: {0}")]
    ClaimNotFound(ClaimId),

    #[error("No invoice has been generated for claim {0}")]
    InvoiceNotFound(ClaimId),

    /// A field failed validation; the caller still owns its input
    #[error("Validation failed: {0}")]
    Validation(FieldError),

    /// The row changed between read and write and still exists
    #[error("Claim {0} was modified by another request")]
    ConcurrencyConflict(ClaimId),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Unknown claim status: {0}")]
    UnknownStatus(String),

    #[error("Store error: {0}")]
    Store(#[from] PortError),
}

impl ClaimError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClaimError::ClaimNotFound(_) | ClaimError::InvoiceNotFound(_))
    }

    /// The rejected field, for validation failures
    pub fn field_error(&self) -> Option<&FieldError> {
        match self {
            ClaimError::Validation(field) => Some(field),
            _ => None,
        }
    }
}

impl From<FieldError> for ClaimError {
    fn from(error: FieldError) -> Self {
        ClaimError::Validation(error)
    }
}

impl From<AttachmentError> for ClaimError {
    fn from(error: AttachmentError) -> Self {
        ClaimError::Validation(FieldError::new(ATTACHMENT_FIELD, error.to_string()))
    }
}
