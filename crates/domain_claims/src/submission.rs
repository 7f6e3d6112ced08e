//! Transport-side claim payloads
//!
//! `ClaimSubmission` carries what a lecturer posts, including the raw upload.
//! It is validated into [`ClaimFields`] (and, separately, an
//! [`Attachment`](crate::attachment::Attachment)) before anything reaches the
//! claim entity, so the upload bytes never live on a persisted type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use core_kernel::{Amount, ClaimId};

/// A rejected field and the message shown next to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// An uploaded file as received from the client
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Bytes are elided; a 5 MiB dump in a log line helps nobody.
impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Claim form as posted by a lecturer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimSubmission {
    pub lecturer_id: String,
    pub hours_worked: Decimal,
    pub hourly_rate: Decimal,
    pub total_amount: Decimal,
    /// Defaults to the time of submission when absent
    pub submitted_at: Option<DateTime<Utc>>,
    pub document_type: String,
    pub notes: String,
    pub attachment: Option<Upload>,
}

impl ClaimSubmission {
    /// Validates the scalar fields
    ///
    /// The attachment is checked separately by the attachment policy.
    pub fn fields(&self) -> Result<ClaimFields, FieldError> {
        Ok(ClaimFields {
            lecturer_id: self.lecturer_id.trim().to_string(),
            hours_worked: amount("hours_worked", self.hours_worked)?,
            hourly_rate: amount("hourly_rate", self.hourly_rate)?,
            total_amount: amount("total_amount", self.total_amount)?,
            submitted_at: self.submitted_at,
            document_type: self.document_type.trim().to_string(),
            notes: self.notes.clone(),
        })
    }

    /// The upload, if one with content was supplied
    ///
    /// An empty file part is treated the same as no file.
    pub fn upload(&self) -> Option<&Upload> {
        self.attachment.as_ref().filter(|upload| !upload.is_empty())
    }
}

/// Edit form: the claim it targets plus the replacement fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimEdit {
    /// Id carried in the payload; must agree with the id in the path
    pub claim_id: ClaimId,
    /// Version the editor last saw; `None` accepts whatever is current
    pub version: Option<i32>,
    pub details: ClaimSubmission,
}

/// Validated, submitter-editable claim fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimFields {
    pub lecturer_id: String,
    pub hours_worked: Amount,
    pub hourly_rate: Amount,
    pub total_amount: Amount,
    pub submitted_at: Option<DateTime<Utc>>,
    pub document_type: String,
    pub notes: String,
}

fn amount(field: &str, value: Decimal) -> Result<Amount, FieldError> {
    Amount::new(value).map_err(|e| FieldError::new(field, e.to_string()))
}
