//! Claim aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{Amount, ClaimId};
use crate::attachment::Attachment;
use crate::error::ClaimError;
use crate::submission::ClaimFields;

/// Claim status
///
/// The plain discriminant of [`ClaimState`]. This is what gets persisted in
/// the `status` column and what list queries filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Submitted, awaiting review
    Pending,
    /// Approved by a manager or coordinator
    Approved,
    /// Rejected by a manager or coordinator
    Rejected,
    /// Invoiced by HR
    InvoiceGenerated,
    /// Paid (reserved, no operation reaches it yet)
    Paid,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 5] = [
        ClaimStatus::Pending,
        ClaimStatus::Approved,
        ClaimStatus::Rejected,
        ClaimStatus::InvoiceGenerated,
        ClaimStatus::Paid,
    ];

    /// Column value
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
            ClaimStatus::InvoiceGenerated => "invoice_generated",
            ClaimStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClaimStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ClaimError::UnknownStatus(s.to_string()))
    }
}

/// Lifecycle state of a claim, carrying the data each state owns
///
/// ```text
/// Pending -> Approved -> Invoiced -> Paid
///         -> Rejected
/// ```
///
/// HR can stamp an invoice on any claim, so `Invoiced` keeps whatever review
/// data the claim had at that point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClaimState {
    Pending,
    Approved {
        at: DateTime<Utc>,
    },
    Rejected {
        comment: String,
    },
    Invoiced {
        approved_at: Option<DateTime<Utc>>,
        comment: String,
        at: DateTime<Utc>,
    },
    Paid,
}

impl ClaimState {
    pub fn status(&self) -> ClaimStatus {
        match self {
            ClaimState::Pending => ClaimStatus::Pending,
            ClaimState::Approved { .. } => ClaimStatus::Approved,
            ClaimState::Rejected { .. } => ClaimStatus::Rejected,
            ClaimState::Invoiced { .. } => ClaimStatus::InvoiceGenerated,
            ClaimState::Paid => ClaimStatus::Paid,
        }
    }

    /// Rebuilds a state from its persisted columns
    ///
    /// Returns `None` when the columns required by the status are missing.
    pub fn from_columns(
        status: ClaimStatus,
        approval_date: Option<DateTime<Utc>>,
        invoice_generated: Option<DateTime<Utc>>,
        comments: &str,
    ) -> Option<Self> {
        let state = match status {
            ClaimStatus::Pending => ClaimState::Pending,
            ClaimStatus::Approved => ClaimState::Approved { at: approval_date? },
            ClaimStatus::Rejected => ClaimState::Rejected {
                comment: comments.to_string(),
            },
            ClaimStatus::InvoiceGenerated => ClaimState::Invoiced {
                approved_at: approval_date,
                comment: comments.to_string(),
                at: invoice_generated?,
            },
            ClaimStatus::Paid => ClaimState::Paid,
        };
        Some(state)
    }
}

/// A lecturer's claim for payment of hours worked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Store-generated identifier
    pub id: ClaimId,
    /// Lecturer reference as entered on the form
    pub lecturer_id: String,
    /// Identity (email) of the submitting user
    pub submitted_by: String,
    pub hours_worked: Amount,
    pub hourly_rate: Amount,
    /// Caller-supplied total, never derived from hours and rate
    pub total_amount: Amount,
    pub state: ClaimState,
    pub submitted_at: DateTime<Utc>,
    pub document_type: String,
    pub attachment: Option<Attachment>,
    /// Reviewer who approved or rejected the claim
    pub approval_by: Option<String>,
    /// Submitter-authored notes
    pub notes: String,
    /// Optimistic concurrency token, bumped by the store on every write
    pub version: i32,
}

impl Claim {
    pub fn status(&self) -> ClaimStatus {
        self.state.status()
    }

    /// When the claim was approved, if it ever was
    pub fn approval_date(&self) -> Option<DateTime<Utc>> {
        match self.state {
            ClaimState::Approved { at } => Some(at),
            ClaimState::Invoiced { approved_at, .. } => approved_at,
            _ => None,
        }
    }

    /// When HR last stamped the invoice
    pub fn invoice_generated(&self) -> Option<DateTime<Utc>> {
        match self.state {
            ClaimState::Invoiced { at, .. } => Some(at),
            _ => None,
        }
    }

    /// Reviewer comments (the rejection reason)
    pub fn comments(&self) -> &str {
        match &self.state {
            ClaimState::Rejected { comment } | ClaimState::Invoiced { comment, .. } => comment,
            _ => "",
        }
    }

    /// Human-readable status for display
    pub fn approval_status(&self) -> &'static str {
        match self.state {
            ClaimState::Pending => "Pending",
            ClaimState::Approved { .. } => "Approved",
            ClaimState::Rejected { .. } => "Rejected",
            ClaimState::Invoiced { .. } => "Invoice Generated",
            ClaimState::Paid => "Paid",
        }
    }

    /// Approves a pending claim
    pub fn approve(&mut self, reviewer: &str, at: DateTime<Utc>) -> Result<(), ClaimError> {
        self.ensure_transition(ClaimStatus::Approved)?;
        self.state = ClaimState::Approved { at };
        self.approval_by = Some(reviewer.to_string());
        Ok(())
    }

    /// Rejects a pending claim; an empty comment is accepted
    pub fn reject(&mut self, reviewer: &str, comment: impl Into<String>) -> Result<(), ClaimError> {
        self.ensure_transition(ClaimStatus::Rejected)?;
        self.state = ClaimState::Rejected {
            comment: comment.into(),
        };
        self.approval_by = Some(reviewer.to_string());
        Ok(())
    }

    /// Stamps the invoice timestamp on a claim in any status
    ///
    /// Stamping an already invoiced claim overwrites the previous timestamp.
    /// Returns the status the claim had before the stamp.
    pub fn mark_invoiced(&mut self, at: DateTime<Utc>) -> ClaimStatus {
        let previous = self.status();
        self.state = ClaimState::Invoiced {
            approved_at: self.approval_date(),
            comment: self.comments().to_string(),
            at,
        };
        previous
    }

    /// Replaces every submitter-editable field
    ///
    /// The attachment is only replaced when a new one is supplied. Returns the
    /// attachment that was replaced, if any.
    pub fn apply_edit(
        &mut self,
        fields: ClaimFields,
        attachment: Option<Attachment>,
    ) -> Option<Attachment> {
        self.lecturer_id = fields.lecturer_id;
        self.hours_worked = fields.hours_worked;
        self.hourly_rate = fields.hourly_rate;
        self.total_amount = fields.total_amount;
        if let Some(submitted_at) = fields.submitted_at {
            self.submitted_at = submitted_at;
        }
        self.document_type = fields.document_type;
        self.notes = fields.notes;
        match attachment {
            Some(attachment) => self.attachment.replace(attachment),
            None => None,
        }
    }

    fn ensure_transition(&self, target: ClaimStatus) -> Result<(), ClaimError> {
        if !self.can_transition_to(target) {
            return Err(self.transition_error(target));
        }
        Ok(())
    }

    fn transition_error(&self, target: ClaimStatus) -> ClaimError {
        ClaimError::InvalidStatusTransition {
            from: self.status().to_string(),
            to: target.to_string(),
        }
    }

    /// Checks if transition is valid
    pub fn can_transition_to(&self, target: ClaimStatus) -> bool {
        use ClaimStatus::*;
        matches!(
            (self.status(), target),
            (Pending, Approved) |
            (Pending, Rejected) |
            (_, InvoiceGenerated) |
            (InvoiceGenerated, Paid)
        )
    }
}

/// Data for inserting a new claim; the store assigns the id and version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClaim {
    pub lecturer_id: String,
    pub submitted_by: String,
    pub hours_worked: Amount,
    pub hourly_rate: Amount,
    pub total_amount: Amount,
    pub submitted_at: DateTime<Utc>,
    pub document_type: String,
    pub attachment: Option<Attachment>,
    pub notes: String,
}

impl NewClaim {
    /// Builds a pending claim owned by `submitted_by`
    pub fn from_fields(
        fields: ClaimFields,
        submitted_by: impl Into<String>,
        attachment: Option<Attachment>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            lecturer_id: fields.lecturer_id,
            submitted_by: submitted_by.into(),
            hours_worked: fields.hours_worked,
            hourly_rate: fields.hourly_rate,
            total_amount: fields.total_amount,
            submitted_at: fields.submitted_at.unwrap_or(now),
            document_type: fields.document_type,
            attachment,
            notes: fields.notes,
        }
    }

    /// Materialises the stored claim once the store has assigned an id
    pub fn into_claim(self, id: ClaimId) -> Claim {
        Claim {
            id,
            lecturer_id: self.lecturer_id,
            submitted_by: self.submitted_by,
            hours_worked: self.hours_worked,
            hourly_rate: self.hourly_rate,
            total_amount: self.total_amount,
            state: ClaimState::Pending,
            submitted_at: self.submitted_at,
            document_type: self.document_type,
            attachment: self.attachment,
            approval_by: None,
            notes: self.notes,
            version: 1,
        }
    }
}
