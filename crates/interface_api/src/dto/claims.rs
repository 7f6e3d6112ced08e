//! Claims DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::ClaimId;
use domain_claims::{Claim, ClaimEdit, ClaimStatus, ClaimSubmission, Invoice, Upload};

use crate::error::ApiError;

/// Text fields of the claim form, as received
///
/// Numbers stay strings until [`ClaimForm::into_submission`] so a bad value is
/// reported against its own field.
#[derive(Debug, Clone, Default, Validate)]
pub struct ClaimForm {
    #[validate(length(min = 1, max = 100, message = "Lecturer ID is required"))]
    pub lecturer_id: String,
    pub hours_worked: Option<String>,
    pub hourly_rate: Option<String>,
    pub total_amount: Option<String>,
    pub submitted_at: Option<String>,
    #[validate(length(max = 100, message = "Document type is too long"))]
    pub document_type: String,
    #[validate(length(max = 4000, message = "Notes are too long"))]
    pub notes: String,
    /// Claim the edit targets; defaults to the id in the path
    pub claim_id: Option<String>,
    /// Version the editor last saw
    pub version: Option<String>,
}

impl ClaimForm {
    /// Records a text field by its form name; unknown names are ignored
    pub fn set(&mut self, name: &str, value: String) {
        match name {
            "lecturer_id" => self.lecturer_id = value,
            "hours_worked" => self.hours_worked = Some(value),
            "hourly_rate" => self.hourly_rate = Some(value),
            "total_amount" => self.total_amount = Some(value),
            "submitted_at" => self.submitted_at = Some(value),
            "document_type" => self.document_type = value,
            "notes" => self.notes = value,
            "claim_id" => self.claim_id = Some(value),
            "version" => self.version = Some(value),
            _ => {}
        }
    }

    /// Validates the text fields and pairs them with the upload
    pub fn into_submission(self, attachment: Option<Upload>) -> Result<ClaimSubmission, ApiError> {
        self.validate()?;

        let submitted_at = match non_blank(&self.submitted_at) {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(raw)
                    .map_err(|_| ApiError::field("submitted_at", "Expected an RFC 3339 timestamp"))?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        Ok(ClaimSubmission {
            hours_worked: decimal("hours_worked", &self.hours_worked)?,
            hourly_rate: decimal("hourly_rate", &self.hourly_rate)?,
            total_amount: decimal("total_amount", &self.total_amount)?,
            lecturer_id: self.lecturer_id,
            submitted_at,
            document_type: self.document_type,
            notes: self.notes,
            attachment,
        })
    }

    /// Builds an edit of the claim at `path_id`
    pub fn into_edit(self, path_id: ClaimId, attachment: Option<Upload>) -> Result<ClaimEdit, ApiError> {
        let claim_id = match non_blank(&self.claim_id) {
            Some(raw) => raw
                .parse::<ClaimId>()
                .map_err(|_| ApiError::field("claim_id", "Invalid claim id"))?,
            None => path_id,
        };
        let version = match non_blank(&self.version) {
            Some(raw) => Some(
                raw.parse::<i32>()
                    .map_err(|_| ApiError::field("version", "Invalid version"))?,
            ),
            None => None,
        };

        Ok(ClaimEdit {
            claim_id,
            version,
            details: self.into_submission(attachment)?,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn decimal(field: &str, value: &Option<String>) -> Result<Decimal, ApiError> {
    let raw = non_blank(value).ok_or_else(|| ApiError::field(field, format!("{field} is required")))?;
    raw.parse::<Decimal>()
        .map_err(|_| ApiError::field(field, format!("{field} must be a number")))
}

/// Body of a rejection
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RejectRequest {
    /// Reviewer's reason; may be empty
    #[serde(default)]
    #[validate(length(max = 2000, message = "Comment is too long"))]
    pub comment: String,
}

#[derive(Debug, Serialize)]
pub struct AttachmentResponse {
    pub original_file_name: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub id: i64,
    pub lecturer_id: String,
    pub submitted_by: String,
    pub hours_worked: Decimal,
    pub hourly_rate: Decimal,
    pub total_amount: Decimal,
    pub status: ClaimStatus,
    /// Display form of the status
    pub approval_status: String,
    pub submitted_at: DateTime<Utc>,
    pub approval_date: Option<DateTime<Utc>>,
    pub invoice_generated: Option<DateTime<Utc>>,
    pub approval_by: Option<String>,
    pub comments: String,
    pub notes: String,
    pub document_type: String,
    pub attachment: Option<AttachmentResponse>,
    pub version: i32,
}

impl From<Claim> for ClaimResponse {
    fn from(claim: Claim) -> Self {
        Self {
            id: claim.id.value(),
            status: claim.status(),
            approval_status: claim.approval_status().to_string(),
            approval_date: claim.approval_date(),
            invoice_generated: claim.invoice_generated(),
            comments: claim.comments().to_string(),
            hours_worked: claim.hours_worked.value(),
            hourly_rate: claim.hourly_rate.value(),
            total_amount: claim.total_amount.value(),
            attachment: claim.attachment.map(|a| AttachmentResponse {
                original_file_name: a.original_file_name,
                url: a.url,
            }),
            lecturer_id: claim.lecturer_id,
            submitted_by: claim.submitted_by,
            submitted_at: claim.submitted_at,
            approval_by: claim.approval_by,
            notes: claim.notes,
            document_type: claim.document_type,
            version: claim.version,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: i64,
    pub claim_id: i64,
    pub invoice_number: String,
    pub generated_by: String,
    pub generated_at: DateTime<Utc>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id.value(),
            claim_id: invoice.claim_id.value(),
            invoice_number: invoice.invoice_number,
            generated_by: invoice.generated_by,
            generated_at: invoice.generated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateInvoiceResponse {
    pub claim: ClaimResponse,
    pub invoice: InvoiceResponse,
}
