//! Claims workflow service
//!
//! `ClaimWorkflow` is the single entry point for every claim operation. Each
//! call checks the caller's roles against [`allowed`](crate::access::allowed)
//! before touching the store, then loads the claim, applies the state change
//! on the entity and writes it back under the store's version check.
//!
//! ```text
//! Lecturer:            submit, list_own, edit, delete
//! Manager/Coordinator: list_pending, list_history, approve, reject
//! HR:                  list_approved_uninvoiced, generate_invoice,
//!                      list_generated_invoices, invoice_for
//! Any role:            details
//! ```
//!
//! Submissions and edits take the payload by reference: a validation failure
//! leaves the caller holding its input so the form can be shown again.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use core_kernel::{ClaimId, PortError};

use crate::access::{Operation, Principal};
use crate::attachment::{Attachment, AttachmentPolicy};
use crate::claim::{Claim, ClaimStatus, NewClaim};
use crate::error::ClaimError;
use crate::invoice::{Invoice, NewInvoice};
use crate::ports::{AttachmentStorage, ClaimQuery, ClaimStore};
use crate::submission::{ClaimEdit, ClaimSubmission, Upload};

/// Source of "now" for timestamps
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Statuses shown in the reviewers' history view
pub const HISTORY_STATUSES: [ClaimStatus; 4] = [
    ClaimStatus::Approved,
    ClaimStatus::Rejected,
    ClaimStatus::InvoiceGenerated,
    ClaimStatus::Paid,
];

/// Orchestrates the claim lifecycle over the store and attachment ports
#[derive(Clone)]
pub struct ClaimWorkflow {
    store: Arc<dyn ClaimStore>,
    storage: Arc<dyn AttachmentStorage>,
    attachments: AttachmentPolicy,
    clock: Clock,
}

impl ClaimWorkflow {
    /// Creates a workflow with the default attachment policy and wall clock
    pub fn new(store: Arc<dyn ClaimStore>, storage: Arc<dyn AttachmentStorage>) -> Self {
        Self {
            store,
            storage,
            attachments: AttachmentPolicy::default(),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the attachment policy
    pub fn with_attachment_policy(mut self, policy: AttachmentPolicy) -> Self {
        self.attachments = policy;
        self
    }

    /// Replaces the clock
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// The underlying store, for health checks
    pub fn store(&self) -> &Arc<dyn ClaimStore> {
        &self.store
    }

    /// Upload rules applied to submissions and edits
    pub fn attachment_policy(&self) -> &AttachmentPolicy {
        &self.attachments
    }

    // ========================================================================
    // Lecturer operations
    // ========================================================================

    /// Submits a new claim owned by the caller
    ///
    /// The attachment is validated before anything is written. If the row
    /// cannot be inserted the stored file is removed again.
    pub async fn submit(
        &self,
        actor: &dyn Principal,
        submission: &ClaimSubmission,
    ) -> Result<Claim, ClaimError> {
        self.authorize(actor, Operation::Submit)?;

        let fields = submission.fields()?;
        let attachment = self.prepare_attachment(submission.upload())?;
        let now = (self.clock)();

        if let Some((attachment, upload)) = &attachment {
            self.storage.store(attachment, &upload.bytes).await?;
        }
        let attachment = attachment.map(|(attachment, _)| attachment);

        let new_claim = NewClaim::from_fields(fields, actor.identity(), attachment.clone(), now);
        let claim = match self.store.insert(new_claim).await {
            Ok(claim) => claim,
            Err(e) => {
                if let Some(attachment) = &attachment {
                    self.discard(attachment).await;
                }
                return Err(e.into());
            }
        };

        info!(
            claim_id = %claim.id,
            submitted_by = %claim.submitted_by,
            total_amount = %claim.total_amount,
            has_attachment = claim.attachment.is_some(),
            "Claim submitted"
        );
        Ok(claim)
    }

    /// Every claim the caller submitted, in any status
    pub async fn list_own(&self, actor: &dyn Principal) -> Result<Vec<Claim>, ClaimError> {
        self.authorize(actor, Operation::ListOwn)?;
        self.find(ClaimQuery::owned_by(actor.identity())).await
    }

    /// Replaces the submitter-editable fields of a claim
    ///
    /// `id` is the claim addressed by the request; a payload naming a
    /// different claim is treated as not found. When `edit.version` is set the
    /// write only succeeds if the stored claim still carries that version.
    /// Review state is never changed by an edit.
    pub async fn edit(
        &self,
        actor: &dyn Principal,
        id: ClaimId,
        edit: &ClaimEdit,
    ) -> Result<Claim, ClaimError> {
        self.authorize(actor, Operation::Edit)?;
        if edit.claim_id != id {
            debug!(path_id = %id, payload_id = %edit.claim_id, "Edit payload names another claim");
            return Err(ClaimError::ClaimNotFound(id));
        }

        let fields = edit.details.fields()?;
        let attachment = self.prepare_attachment(edit.details.upload())?;

        let mut claim = self.load(id).await?;
        if let Some(version) = edit.version {
            claim.version = version;
        }

        if let Some((attachment, upload)) = &attachment {
            self.storage.store(attachment, &upload.bytes).await?;
        }
        let attachment = attachment.map(|(attachment, _)| attachment);

        let replaced = claim.apply_edit(fields, attachment.clone());
        let updated = match self.store.update(&claim).await {
            Ok(updated) => updated,
            Err(e) => {
                if let Some(attachment) = &attachment {
                    self.discard(attachment).await;
                }
                return Err(self.write_failure(id, e).await);
            }
        };

        if let Some(old) = &replaced {
            self.discard(old).await;
        }

        info!(
            claim_id = %id,
            edited_by = %actor.identity(),
            version = updated.version,
            attachment_replaced = replaced.is_some(),
            "Claim edited"
        );
        Ok(updated)
    }

    /// Deletes a claim and its stored attachment; deleting an absent claim succeeds
    pub async fn delete(&self, actor: &dyn Principal, id: ClaimId) -> Result<(), ClaimError> {
        self.authorize(actor, Operation::Delete)?;

        match self.store.delete(id).await? {
            Some(claim) => {
                if let Some(attachment) = &claim.attachment {
                    self.discard(attachment).await;
                }
                info!(claim_id = %id, deleted_by = %actor.identity(), "Claim deleted");
            }
            None => debug!(claim_id = %id, "Delete of absent claim ignored"),
        }
        Ok(())
    }

    /// A single claim, for any caller holding a known role
    pub async fn details(&self, actor: &dyn Principal, id: ClaimId) -> Result<Claim, ClaimError> {
        self.authorize(actor, Operation::ViewDetails)?;
        self.load(id).await
    }

    // ========================================================================
    // Reviewer operations
    // ========================================================================

    /// Claims awaiting review
    pub async fn list_pending(&self, actor: &dyn Principal) -> Result<Vec<Claim>, ClaimError> {
        self.authorize(actor, Operation::ListPending)?;
        self.find(ClaimQuery::default().with_statuses([ClaimStatus::Pending]))
            .await
    }

    /// Reviewed claims, including those invoiced since approval
    pub async fn list_history(&self, actor: &dyn Principal) -> Result<Vec<Claim>, ClaimError> {
        self.authorize(actor, Operation::ListHistory)?;
        self.find(ClaimQuery::default().with_statuses(HISTORY_STATUSES))
            .await
    }

    /// Approves a pending claim, recording the reviewer and approval time
    pub async fn approve(&self, actor: &dyn Principal, id: ClaimId) -> Result<Claim, ClaimError> {
        self.authorize(actor, Operation::Approve)?;

        let mut claim = self.load(id).await?;
        claim.approve(actor.identity(), (self.clock)())?;
        let claim = self.save(&claim).await?;

        info!(claim_id = %id, approved_by = %actor.identity(), "Claim approved");
        Ok(claim)
    }

    /// Rejects a pending claim with the reviewer's comment
    pub async fn reject(
        &self,
        actor: &dyn Principal,
        id: ClaimId,
        comment: &str,
    ) -> Result<Claim, ClaimError> {
        self.authorize(actor, Operation::Reject)?;

        let mut claim = self.load(id).await?;
        claim.reject(actor.identity(), comment)?;
        let claim = self.save(&claim).await?;

        info!(claim_id = %id, rejected_by = %actor.identity(), "Claim rejected");
        Ok(claim)
    }

    // ========================================================================
    // HR operations
    // ========================================================================

    /// Approved claims that have not been invoiced
    pub async fn list_approved_uninvoiced(
        &self,
        actor: &dyn Principal,
    ) -> Result<Vec<Claim>, ClaimError> {
        self.authorize(actor, Operation::ListApprovedUninvoiced)?;
        self.find(ClaimQuery::default().with_statuses([ClaimStatus::Approved]))
            .await
    }

    /// Stamps the invoice time on a claim and records its invoice
    ///
    /// The claim's status is not checked: any existing claim is stamped, and
    /// a claim that was never approved is only logged. Invoicing an already
    /// invoiced claim moves the stamp forward and returns the invoice recorded
    /// the first time.
    pub async fn generate_invoice(
        &self,
        actor: &dyn Principal,
        id: ClaimId,
    ) -> Result<(Claim, Invoice), ClaimError> {
        self.authorize(actor, Operation::GenerateInvoice)?;

        let mut claim = self.load(id).await?;
        let now = (self.clock)();
        let previous = claim.mark_invoiced(now);
        if !matches!(previous, ClaimStatus::Approved | ClaimStatus::InvoiceGenerated) {
            warn!(claim_id = %id, status = %previous, "Invoicing a claim that was not approved");
        }

        let invoice = NewInvoice::new(id, actor.identity(), now);
        let (claim, invoice) = match self.store.record_invoice(&claim, invoice).await {
            Ok(recorded) => recorded,
            Err(e) => return Err(self.write_failure(id, e).await),
        };

        info!(
            claim_id = %id,
            invoice_number = %invoice.invoice_number,
            generated_by = %actor.identity(),
            "Invoice generated"
        );
        Ok((claim, invoice))
    }

    /// Claims with an invoice stamp
    pub async fn list_generated_invoices(
        &self,
        actor: &dyn Principal,
    ) -> Result<Vec<Claim>, ClaimError> {
        self.authorize(actor, Operation::ListGeneratedInvoices)?;
        self.find(ClaimQuery::default().with_statuses([ClaimStatus::InvoiceGenerated]))
            .await
    }

    /// The invoice recorded for a claim
    pub async fn invoice_for(
        &self,
        actor: &dyn Principal,
        id: ClaimId,
    ) -> Result<Invoice, ClaimError> {
        self.authorize(actor, Operation::ViewInvoice)?;

        match self.store.invoice_for_claim(id).await? {
            Some(invoice) => Ok(invoice),
            None if self.store.exists(id).await? => Err(ClaimError::InvoiceNotFound(id)),
            None => Err(ClaimError::ClaimNotFound(id)),
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Fails with `NotPermitted` unless one of the actor's roles grants `operation`
    ///
    /// Every operation runs this first; callers that do expensive input
    /// handling before invoking an operation can run it up front.
    pub fn authorize(&self, actor: &dyn Principal, operation: Operation) -> Result<(), ClaimError> {
        if actor.may(operation) {
            return Ok(());
        }
        warn!(identity = %actor.identity(), %operation, "Operation not permitted");
        Err(ClaimError::NotPermitted {
            identity: actor.identity().to_string(),
            operation,
        })
    }

    fn prepare_attachment<'a>(
        &self,
        upload: Option<&'a Upload>,
    ) -> Result<Option<(Attachment, &'a Upload)>, ClaimError> {
        match upload {
            Some(upload) => {
                let attachment = self.attachments.prepare(&upload.file_name, upload.len())?;
                Ok(Some((attachment, upload)))
            }
            None => Ok(None),
        }
    }

    async fn load(&self, id: ClaimId) -> Result<Claim, ClaimError> {
        self.store
            .get(id)
            .await?
            .ok_or(ClaimError::ClaimNotFound(id))
    }

    async fn find(&self, query: ClaimQuery) -> Result<Vec<Claim>, ClaimError> {
        let claims = self.store.find(query.clone()).await?;
        debug!(?query, count = claims.len(), "Claims listed");
        Ok(claims)
    }

    async fn save(&self, claim: &Claim) -> Result<Claim, ClaimError> {
        match self.store.update(claim).await {
            Ok(saved) => Ok(saved),
            Err(e) => Err(self.write_failure(claim.id, e).await),
        }
    }

    /// Maps a failed versioned write
    ///
    /// A conflict on a row that has since been deleted reads as not found;
    /// otherwise the conflict is reported as is.
    async fn write_failure(&self, id: ClaimId, error: PortError) -> ClaimError {
        if !error.is_conflict() {
            return error.into();
        }
        match self.store.exists(id).await {
            Ok(false) => ClaimError::ClaimNotFound(id),
            Ok(true) => {
                warn!(claim_id = %id, "Concurrent modification detected");
                ClaimError::ConcurrencyConflict(id)
            }
            Err(e) => e.into(),
        }
    }

    /// Best-effort removal of a file no claim references any more
    async fn discard(&self, attachment: &Attachment) {
        if let Err(e) = self.storage.remove(attachment).await {
            warn!(
                storage_name = %attachment.storage_name,
                error = %e,
                "Failed to remove orphaned attachment"
            );
        }
    }
}

impl std::fmt::Debug for ClaimWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimWorkflow")
            .field("attachments", &self.attachments)
            .finish_non_exhaustive()
    }
}
