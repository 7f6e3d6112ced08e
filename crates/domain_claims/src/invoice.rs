//! Invoice records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{ClaimId, InvoiceId};

/// An invoice generated by HR for an approved claim
///
/// One per claim. Never updated or deleted once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub claim_id: ClaimId,
    /// HR user who generated it
    pub generated_by: String,
    pub generated_at: DateTime<Utc>,
    /// Unique token printed on the invoice
    pub invoice_number: String,
}

/// Data for recording a new invoice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    pub claim_id: ClaimId,
    pub generated_by: String,
    pub generated_at: DateTime<Utc>,
    pub invoice_number: String,
}

impl NewInvoice {
    pub fn new(claim_id: ClaimId, generated_by: impl Into<String>, generated_at: DateTime<Utc>) -> Self {
        Self {
            claim_id,
            generated_by: generated_by.into(),
            generated_at,
            invoice_number: generate_invoice_number(),
        }
    }

    pub fn into_invoice(self, id: InvoiceId) -> Invoice {
        Invoice {
            id,
            claim_id: self.claim_id,
            generated_by: self.generated_by,
            generated_at: self.generated_at,
            invoice_number: self.invoice_number,
        }
    }
}

fn generate_invoice_number() -> String {
    format!("INV-{}", Uuid::new_v4())
}
