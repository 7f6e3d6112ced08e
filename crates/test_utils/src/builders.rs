//! Test Data Builders
//!
//! Builders that let a test name only the fields it cares about.

use chrono::{DateTime, Utc};
use core_kernel::{Amount, ClaimId};
use domain_claims::{Attachment, Claim, ClaimEdit, ClaimState, ClaimSubmission, Upload};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::fixtures::{ActorFixtures, TemporalFixtures};

/// Builder for claim form submissions
#[derive(Debug, Clone)]
pub struct SubmissionBuilder {
    submission: ClaimSubmission,
}

impl Default for SubmissionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionBuilder {
    /// 8 hours at 250.00, no attachment
    pub fn new() -> Self {
        Self {
            submission: ClaimSubmission {
                lecturer_id: "LEC-001".to_string(),
                hours_worked: dec!(8),
                hourly_rate: dec!(250.00),
                total_amount: dec!(2000.00),
                submitted_at: None,
                document_type: "Timesheet".to_string(),
                notes: "March tutorials".to_string(),
                attachment: None,
            },
        }
    }

    pub fn with_lecturer_id(mut self, lecturer_id: impl Into<String>) -> Self {
        self.submission.lecturer_id = lecturer_id.into();
        self
    }

    /// Sets hours and rate and recomputes the total
    pub fn with_hours(mut self, hours: Decimal, rate: Decimal) -> Self {
        self.submission.hours_worked = hours;
        self.submission.hourly_rate = rate;
        self.submission.total_amount = hours * rate;
        self
    }

    pub fn with_total_amount(mut self, total: Decimal) -> Self {
        self.submission.total_amount = total;
        self
    }

    pub fn with_submitted_at(mut self, at: DateTime<Utc>) -> Self {
        self.submission.submitted_at = Some(at);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.submission.notes = notes.into();
        self
    }

    pub fn with_attachment(mut self, upload: Upload) -> Self {
        self.submission.attachment = Some(upload);
        self
    }

    pub fn build(self) -> ClaimSubmission {
        self.submission
    }

    /// Wraps the submission as an edit of `claim_id`
    pub fn build_edit(self, claim_id: ClaimId, version: Option<i32>) -> ClaimEdit {
        ClaimEdit {
            claim_id,
            version,
            details: self.submission,
        }
    }
}

/// Builder for stored claims, used to seed mock stores
#[derive(Debug, Clone)]
pub struct ClaimBuilder {
    claim: Claim,
}

impl Default for ClaimBuilder {
    fn default() -> Self {
        Self::new(1)
    }
}

impl ClaimBuilder {
    /// A pending claim owned by [`ActorFixtures::LECTURER`]
    pub fn new(id: i64) -> Self {
        Self {
            claim: Claim {
                id: ClaimId::new(id),
                lecturer_id: "LEC-001".to_string(),
                submitted_by: ActorFixtures::LECTURER.to_string(),
                hours_worked: amount(dec!(8)),
                hourly_rate: amount(dec!(250.00)),
                total_amount: amount(dec!(2000.00)),
                state: ClaimState::Pending,
                submitted_at: TemporalFixtures::now(),
                document_type: "Timesheet".to_string(),
                attachment: None,
                approval_by: None,
                notes: String::new(),
                version: 1,
            },
        }
    }

    pub fn owned_by(mut self, identity: impl Into<String>) -> Self {
        self.claim.submitted_by = identity.into();
        self
    }

    pub fn with_total_amount(mut self, total: Decimal) -> Self {
        self.claim.total_amount = amount(total);
        self
    }

    pub fn with_version(mut self, version: i32) -> Self {
        self.claim.version = version;
        self
    }

    /// Attaches a stored PDF under a fresh storage name
    pub fn with_attachment(mut self) -> Self {
        let storage_name = format!("{}.pdf", Uuid::new_v4());
        self.claim.attachment = Some(Attachment {
            original_file_name: "timesheet.pdf".to_string(),
            url: format!("/images/{storage_name}"),
            storage_name,
        });
        self
    }

    pub fn approved(mut self) -> Self {
        self.claim.state = ClaimState::Approved {
            at: TemporalFixtures::now(),
        };
        self.claim.approval_by = Some(ActorFixtures::MANAGER.to_string());
        self
    }

    pub fn rejected(mut self, comment: impl Into<String>) -> Self {
        self.claim.state = ClaimState::Rejected {
            comment: comment.into(),
        };
        self.claim.approval_by = Some(ActorFixtures::MANAGER.to_string());
        self
    }

    pub fn invoiced(mut self) -> Self {
        let at = TemporalFixtures::now();
        self.claim.state = ClaimState::Invoiced {
            approved_at: Some(at),
            comment: String::new(),
            at,
        };
        self.claim.approval_by = Some(ActorFixtures::MANAGER.to_string());
        self
    }

    pub fn paid(mut self) -> Self {
        self.claim.state = ClaimState::Paid;
        self
    }

    pub fn build(self) -> Claim {
        self.claim
    }
}

fn amount(value: Decimal) -> Amount {
    Amount::new(value).unwrap()
}

/// A `multipart/form-data` request body
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: format!("claims-boundary-{}", Uuid::new_v4().simple()),
            body: Vec::new(),
        }
    }

    /// The text fields of a submission plus its attachment, if any
    pub fn from_submission(submission: &ClaimSubmission) -> Self {
        let mut body = Self::new()
            .text("lecturer_id", &submission.lecturer_id)
            .text("hours_worked", submission.hours_worked.to_string())
            .text("hourly_rate", submission.hourly_rate.to_string())
            .text("total_amount", submission.total_amount.to_string())
            .text("document_type", &submission.document_type)
            .text("notes", &submission.notes);
        if let Some(at) = submission.submitted_at {
            body = body.text("submitted_at", at.to_rfc3339());
        }
        if let Some(upload) = &submission.attachment {
            body = body.file("attachment", &upload.file_name, &upload.bytes);
        }
        body
    }

    pub fn text(mut self, name: &str, value: impl AsRef<str>) -> Self {
        self.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{}\r\n",
            self.boundary,
            value.as_ref()
        ));
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, bytes: &[u8]) -> Self {
        self.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            self.boundary
        ));
        self.body.extend_from_slice(bytes);
        self.push_str("\r\n");
        self
    }

    /// Value for the `Content-Type` header
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Closes the body and returns its bytes
    pub fn finish(mut self) -> Vec<u8> {
        let closing = format!("--{}--\r\n", self.boundary);
        self.push_str(&closing);
        self.body
    }

    fn push_str(&mut self, s: &str) {
        self.body.extend_from_slice(s.as_bytes());
    }
}
