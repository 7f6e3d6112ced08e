//! Comprehensive tests for domain_claims

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal_macros::dec;

use core_kernel::{ClaimId, DomainPort, HealthCheckResult, HealthCheckable, PortError};

use domain_claims::attachment::{AttachmentError, AttachmentPolicy, MAX_ATTACHMENT_BYTES};
use domain_claims::ports::mock::{MockAttachmentStorage, MockClaimStore};
use domain_claims::ports::{ClaimQuery, ClaimStore};
use domain_claims::{
    Actor, Claim, ClaimEdit, ClaimError, ClaimState, ClaimStatus, ClaimSubmission, ClaimWorkflow,
    Invoice, NewClaim, NewInvoice, Operation, Role, Upload,
};

const LECTURER: &str = "lecturer@example.com";
const MANAGER: &str = "manager@example.com";
const HR: &str = "hr@example.com";

struct Harness {
    workflow: ClaimWorkflow,
    store: Arc<MockClaimStore>,
    storage: Arc<MockAttachmentStorage>,
}

/// Clock that advances one minute per reading
fn ticking_clock() -> domain_claims::Clock {
    let ticks = Arc::new(AtomicI64::new(0));
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    Arc::new(move || start + Duration::minutes(ticks.fetch_add(1, Ordering::SeqCst)))
}

fn harness() -> Harness {
    let store = Arc::new(MockClaimStore::new());
    let storage = Arc::new(MockAttachmentStorage::new());
    let workflow = ClaimWorkflow::new(store.clone(), storage.clone()).with_clock(ticking_clock());
    Harness { workflow, store, storage }
}

fn lecturer() -> Actor {
    Actor::lecturer(LECTURER)
}

fn manager() -> Actor {
    Actor::manager(MANAGER)
}

fn hr() -> Actor {
    Actor::hr(HR)
}

fn submission() -> ClaimSubmission {
    ClaimSubmission {
        lecturer_id: "L-1001".to_string(),
        hours_worked: dec!(12.5),
        hourly_rate: dec!(400),
        total_amount: dec!(5000),
        document_type: "Timesheet".to_string(),
        notes: "March tutorials".to_string(),
        ..Default::default()
    }
}

fn with_upload(file_name: &str, len: usize) -> ClaimSubmission {
    ClaimSubmission {
        attachment: Some(Upload::new(file_name, vec![0u8; len])),
        ..submission()
    }
}

async fn submitted(h: &Harness) -> Claim {
    h.workflow.submit(&lecturer(), &submission()).await.unwrap()
}

async fn approved(h: &Harness) -> Claim {
    let claim = submitted(h).await;
    h.workflow.approve(&manager(), claim.id).await.unwrap()
}

// ============================================================================
// Submission Tests
// ============================================================================

mod submission_tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_without_file() {
        let h = harness();
        let claim = submitted(&h).await;

        assert_eq!(claim.status(), ClaimStatus::Pending);
        assert_eq!(claim.submitted_by, LECTURER);
        assert_eq!(claim.total_amount.value(), dec!(5000));
        assert!(claim.attachment.is_none());
        assert_eq!(h.store.len().await, 1);
    }

    #[tokio::test]
    async fn test_submit_uses_caller_date_when_given() {
        let h = harness();
        let date = Utc.with_ymd_and_hms(2024, 2, 28, 0, 0, 0).unwrap();
        let claim = h
            .workflow
            .submit(&lecturer(), &ClaimSubmission { submitted_at: Some(date), ..submission() })
            .await
            .unwrap();
        assert_eq!(claim.submitted_at, date);
    }

    #[tokio::test]
    async fn test_total_is_never_derived() {
        let h = harness();
        let claim = h
            .workflow
            .submit(&lecturer(), &ClaimSubmission { total_amount: dec!(1), ..submission() })
            .await
            .unwrap();
        assert_eq!(claim.total_amount.value(), dec!(1));
    }

    #[tokio::test]
    async fn test_oversized_file_writes_nothing() {
        let h = harness();
        let input = with_upload("hours.pdf", MAX_ATTACHMENT_BYTES as usize + 1);

        let err = h.workflow.submit(&lecturer(), &input).await.unwrap_err();

        let field = err.field_error().expect("validation error");
        assert_eq!(field.field, "attachment");
        assert!(field.message.contains("File size exceeds limit"));
        assert!(h.store.is_empty().await);
        assert_eq!(h.storage.file_count().await, 0);
        // The caller still holds its input
        assert_eq!(input.lecturer_id, "L-1001");
    }

    #[tokio::test]
    async fn test_unsupported_type_is_rejected() {
        let h = harness();
        let err = h
            .workflow
            .submit(&lecturer(), &with_upload("script.exe", 10))
            .await
            .unwrap_err();

        let field = err.field_error().expect("validation error");
        assert!(field.message.contains("Unsupported file type"));
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_exact_limit_pdf_is_stored() {
        let h = harness();
        let claim = h
            .workflow
            .submit(&lecturer(), &with_upload("hours.pdf", MAX_ATTACHMENT_BYTES as usize))
            .await
            .unwrap();

        let attachment = claim.attachment.expect("attachment");
        assert_eq!(attachment.original_file_name, "hours.pdf");
        assert!(attachment.url.starts_with("/images/"));
        assert!(h.storage.contains(&attachment.storage_name).await);
    }

    #[tokio::test]
    async fn test_empty_upload_is_ignored() {
        let h = harness();
        let claim = h
            .workflow
            .submit(&lecturer(), &with_upload("empty.exe", 0))
            .await
            .unwrap();
        assert!(claim.attachment.is_none());
    }

    #[tokio::test]
    async fn test_negative_amount_is_a_field_error() {
        let h = harness();
        let err = h
            .workflow
            .submit(&lecturer(), &ClaimSubmission { hours_worked: dec!(-2), ..submission() })
            .await
            .unwrap_err();
        assert_eq!(err.field_error().unwrap().field, "hours_worked");
    }

    #[tokio::test]
    async fn test_failed_storage_write_inserts_no_row() {
        let h = harness();
        h.storage.fail_writes();

        let err = h
            .workflow
            .submit(&lecturer(), &with_upload("hours.png", 128))
            .await
            .unwrap_err();

        assert!(matches!(err, ClaimError::Store(_)));
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_own_only_returns_callers_claims() {
        let h = harness();
        submitted(&h).await;
        h.workflow
            .submit(&Actor::lecturer("other@example.com"), &submission())
            .await
            .unwrap();

        let own = h.workflow.list_own(&lecturer()).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].submitted_by, LECTURER);
    }
}

// ============================================================================
// Review Tests
// ============================================================================

mod review_tests {
    use super::*;

    #[tokio::test]
    async fn test_approve_sets_approval_date() {
        let h = harness();
        let claim = approved(&h).await;

        assert_eq!(claim.status(), ClaimStatus::Approved);
        assert!(claim.approval_date().is_some());
        assert_eq!(claim.approval_by.as_deref(), Some(MANAGER));
        assert_eq!(claim.approval_status(), "Approved");
    }

    #[tokio::test]
    async fn test_approve_unknown_is_not_found() {
        let h = harness();
        let err = h.workflow.approve(&manager(), ClaimId::new(99)).await.unwrap_err();
        assert!(matches!(err, ClaimError::ClaimNotFound(id) if id == ClaimId::new(99)));
    }

    #[tokio::test]
    async fn test_reject_with_comment() {
        let h = harness();
        let claim = submitted(&h).await;

        let rejected = h.workflow.reject(&manager(), claim.id, "too vague").await.unwrap();

        assert_eq!(rejected.status(), ClaimStatus::Rejected);
        assert_eq!(rejected.comments(), "too vague");
    }

    #[tokio::test]
    async fn test_reject_accepts_empty_comment() {
        let h = harness();
        let claim = submitted(&h).await;
        let rejected = h.workflow.reject(&manager(), claim.id, "").await.unwrap();
        assert_eq!(rejected.state, ClaimState::Rejected { comment: String::new() });
    }

    #[tokio::test]
    async fn test_cannot_approve_rejected_claim() {
        let h = harness();
        let claim = submitted(&h).await;
        h.workflow.reject(&manager(), claim.id, "no").await.unwrap();

        let err = h.workflow.approve(&manager(), claim.id).await.unwrap_err();
        assert!(matches!(err, ClaimError::InvalidStatusTransition { .. }));
        let stored = h.store.get(claim.id).await.unwrap().unwrap();
        assert_eq!(stored.status(), ClaimStatus::Rejected);
    }

    #[tokio::test]
    async fn test_coordinator_can_review() {
        let h = harness();
        let claim = submitted(&h).await;
        let approved = h
            .workflow
            .approve(&Actor::coordinator("coord@example.com"), claim.id)
            .await
            .unwrap();
        assert_eq!(approved.status(), ClaimStatus::Approved);
    }

    #[tokio::test]
    async fn test_list_pending_excludes_reviewed() {
        let h = harness();
        let pending = submitted(&h).await;
        approved(&h).await;

        let listed = h.workflow.list_pending(&manager()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, pending.id);
    }

    #[tokio::test]
    async fn test_history_includes_invoiced_claims() {
        let h = harness();
        let pending = submitted(&h).await;
        let rejected = submitted(&h).await;
        h.workflow.reject(&manager(), rejected.id, "no").await.unwrap();
        let invoiced = approved(&h).await;
        h.workflow.generate_invoice(&hr(), invoiced.id).await.unwrap();

        let history = h.workflow.list_history(&manager()).await.unwrap();
        let ids: Vec<_> = history.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![rejected.id, invoiced.id]);
        assert!(!ids.contains(&pending.id));
    }
}

// ============================================================================
// Invoice Tests
// ============================================================================

mod invoice_tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_invoice_records_invoice() {
        let h = harness();
        let claim = approved(&h).await;

        let (claim, invoice) = h.workflow.generate_invoice(&hr(), claim.id).await.unwrap();

        assert_eq!(claim.status(), ClaimStatus::InvoiceGenerated);
        assert_eq!(claim.invoice_generated(), Some(invoice.generated_at));
        assert_eq!(invoice.generated_by, HR);
        assert!(invoice.invoice_number.starts_with("INV-"));
        assert_eq!(h.workflow.invoice_for(&hr(), claim.id).await.unwrap(), invoice);
    }

    #[tokio::test]
    async fn test_reinvoicing_overwrites_timestamp_only() {
        let h = harness();
        let claim = approved(&h).await;
        let (first, first_invoice) = h.workflow.generate_invoice(&hr(), claim.id).await.unwrap();
        let (second, second_invoice) = h.workflow.generate_invoice(&hr(), claim.id).await.unwrap();

        assert!(second.invoice_generated() > first.invoice_generated());
        assert_eq!(second.approval_date(), first.approval_date());
        assert_eq!(first_invoice, second_invoice);
        assert_eq!(h.store.invoice_count().await, 1);
    }

    #[tokio::test]
    async fn test_pending_claim_can_be_invoiced() {
        let h = harness();
        let claim = submitted(&h).await;

        let (claim, invoice) = h.workflow.generate_invoice(&hr(), claim.id).await.unwrap();

        assert_eq!(claim.status(), ClaimStatus::InvoiceGenerated);
        assert_eq!(claim.invoice_generated(), Some(invoice.generated_at));
        assert_eq!(claim.approval_date(), None);
        assert_eq!(h.store.invoice_count().await, 1);
    }

    #[tokio::test]
    async fn test_rejected_claim_keeps_comment_when_invoiced() {
        let h = harness();
        let claim = submitted(&h).await;
        h.workflow.reject(&manager(), claim.id, "Missing timesheet").await.unwrap();

        let (claim, _) = h.workflow.generate_invoice(&hr(), claim.id).await.unwrap();

        assert_eq!(claim.status(), ClaimStatus::InvoiceGenerated);
        assert_eq!(claim.comments(), "Missing timesheet");
        assert!(claim.invoice_generated().is_some());
    }

    #[tokio::test]
    async fn test_generate_invoice_unknown_is_not_found() {
        let h = harness();
        let err = h.workflow.generate_invoice(&hr(), ClaimId::new(5)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_approved_list_excludes_invoiced() {
        let h = harness();
        let waiting = approved(&h).await;
        let invoiced = approved(&h).await;
        h.workflow.generate_invoice(&hr(), invoiced.id).await.unwrap();

        let uninvoiced = h.workflow.list_approved_uninvoiced(&hr()).await.unwrap();
        assert_eq!(uninvoiced.iter().map(|c| c.id).collect::<Vec<_>>(), vec![waiting.id]);

        let generated = h.workflow.list_generated_invoices(&hr()).await.unwrap();
        assert_eq!(generated.iter().map(|c| c.id).collect::<Vec<_>>(), vec![invoiced.id]);
    }

    #[tokio::test]
    async fn test_invoice_for_uninvoiced_claim() {
        let h = harness();
        let claim = approved(&h).await;
        let err = h.workflow.invoice_for(&hr(), claim.id).await.unwrap_err();
        assert!(matches!(err, ClaimError::InvoiceNotFound(_)));

        let err = h.workflow.invoice_for(&hr(), ClaimId::new(404)).await.unwrap_err();
        assert!(matches!(err, ClaimError::ClaimNotFound(_)));
    }
}

// ============================================================================
// Edit & Delete Tests
// ============================================================================

mod edit_tests {
    use super::*;

    fn edit_of(claim: &Claim, version: Option<i32>) -> ClaimEdit {
        ClaimEdit {
            claim_id: claim.id,
            version,
            details: ClaimSubmission {
                hours_worked: dec!(20),
                total_amount: dec!(8000),
                notes: "corrected".to_string(),
                ..submission()
            },
        }
    }

    #[tokio::test]
    async fn test_edit_replaces_fields() {
        let h = harness();
        let claim = submitted(&h).await;

        let edited = h
            .workflow
            .edit(&lecturer(), claim.id, &edit_of(&claim, Some(claim.version)))
            .await
            .unwrap();

        assert_eq!(edited.hours_worked.value(), dec!(20));
        assert_eq!(edited.notes, "corrected");
        assert_eq!(edited.version, claim.version + 1);
        assert_eq!(edited.submitted_at, claim.submitted_at);
    }

    #[tokio::test]
    async fn test_edit_keeps_review_state() {
        let h = harness();
        let claim = approved(&h).await;

        let edited = h
            .workflow
            .edit(&lecturer(), claim.id, &edit_of(&claim, None))
            .await
            .unwrap();

        assert_eq!(edited.state, claim.state);
        assert_eq!(edited.status(), ClaimStatus::Approved);
        assert_eq!(edited.approval_date(), claim.approval_date());
        assert_eq!(edited.approval_by.as_deref(), Some(MANAGER));
    }

    #[tokio::test]
    async fn test_edit_oversized_file_writes_nothing() {
        let h = harness();
        let claim = h
            .workflow
            .submit(&lecturer(), &with_upload("first.pdf", 64))
            .await
            .unwrap();

        let mut edit = edit_of(&claim, Some(claim.version));
        edit.details.attachment = Some(Upload::new("big.pdf", vec![0; MAX_ATTACHMENT_BYTES as usize + 1]));
        let err = h.workflow.edit(&lecturer(), claim.id, &edit).await.unwrap_err();

        let field = err.field_error().expect("validation error");
        assert_eq!(field.field, "attachment");
        assert!(field.message.contains("File size exceeds limit"));
        assert_eq!(h.storage.file_count().await, 1);
        assert_eq!(h.store.all().await, vec![claim]);
    }

    #[tokio::test]
    async fn test_edit_unsupported_type_is_rejected() {
        let h = harness();
        let claim = h
            .workflow
            .submit(&lecturer(), &with_upload("first.pdf", 64))
            .await
            .unwrap();

        let mut edit = edit_of(&claim, Some(claim.version));
        edit.details.attachment = Some(Upload::new("macro.docm", vec![1; 16]));
        let err = h.workflow.edit(&lecturer(), claim.id, &edit).await.unwrap_err();

        let field = err.field_error().expect("validation error");
        assert_eq!(field.field, "attachment");
        assert!(field.message.contains("Unsupported file type"));
        assert_eq!(h.storage.file_count().await, 1);

        let stored = &h.store.all().await[0];
        assert_eq!(stored.version, claim.version);
        assert_eq!(stored.attachment, claim.attachment);
    }

    #[tokio::test]
    async fn test_edit_id_mismatch_is_not_found() {
        let h = harness();
        let claim = submitted(&h).await;
        let mut edit = edit_of(&claim, None);
        edit.claim_id = ClaimId::new(claim.id.value() + 1);

        let err = h.workflow.edit(&lecturer(), claim.id, &edit).await.unwrap_err();
        assert!(matches!(err, ClaimError::ClaimNotFound(_)));
    }

    #[tokio::test]
    async fn test_edit_absent_claim_is_not_found() {
        let h = harness();
        let ghost = submitted(&h).await;
        h.workflow.delete(&lecturer(), ghost.id).await.unwrap();

        let err = h
            .workflow
            .edit(&lecturer(), ghost.id, &edit_of(&ghost, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::ClaimNotFound(_)));
    }

    #[tokio::test]
    async fn test_stale_version_on_live_row_is_conflict() {
        let h = harness();
        let claim = submitted(&h).await;
        h.workflow
            .edit(&lecturer(), claim.id, &edit_of(&claim, Some(claim.version)))
            .await
            .unwrap();

        let err = h
            .workflow
            .edit(&lecturer(), claim.id, &edit_of(&claim, Some(claim.version)))
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::ConcurrencyConflict(id) if id == claim.id));
    }

    #[tokio::test]
    async fn test_edit_with_new_file_replaces_and_reclaims_old() {
        let h = harness();
        let claim = h
            .workflow
            .submit(&lecturer(), &with_upload("first.pdf", 64))
            .await
            .unwrap();
        let old = claim.attachment.clone().unwrap();

        let mut edit = edit_of(&claim, None);
        edit.details.attachment = Some(Upload::new("second.xlsx", vec![1; 32]));
        let edited = h.workflow.edit(&lecturer(), claim.id, &edit).await.unwrap();

        let new = edited.attachment.unwrap();
        assert_eq!(new.original_file_name, "second.xlsx");
        assert!(h.storage.contains(&new.storage_name).await);
        assert!(!h.storage.contains(&old.storage_name).await);
    }

    #[tokio::test]
    async fn test_edit_without_file_keeps_attachment() {
        let h = harness();
        let claim = h
            .workflow
            .submit(&lecturer(), &with_upload("first.pdf", 64))
            .await
            .unwrap();

        let edited = h
            .workflow
            .edit(&lecturer(), claim.id, &edit_of(&claim, None))
            .await
            .unwrap();
        assert_eq!(edited.attachment, claim.attachment);
    }

    #[tokio::test]
    async fn test_delete_removes_row_and_file() {
        let h = harness();
        let claim = h
            .workflow
            .submit(&lecturer(), &with_upload("first.pdf", 64))
            .await
            .unwrap();

        h.workflow.delete(&lecturer(), claim.id).await.unwrap();

        assert!(h.store.is_empty().await);
        assert_eq!(h.storage.file_count().await, 0);
    }

    #[tokio::test]
    async fn test_delete_unknown_is_noop() {
        let h = harness();
        let claim = submitted(&h).await;

        h.workflow.delete(&lecturer(), ClaimId::new(77)).await.unwrap();

        assert_eq!(h.store.all().await, vec![claim]);
    }
}

// ============================================================================
// Authorization Tests
// ============================================================================

mod authorization_tests {
    use super::*;

    #[tokio::test]
    async fn test_forbidden_operations_leave_store_untouched() {
        let h = harness();
        let claim = submitted(&h).await;
        let before = h.store.all().await;

        let results = vec![
            h.workflow.approve(&lecturer(), claim.id).await.err(),
            h.workflow.reject(&hr(), claim.id, "x").await.err(),
            h.workflow.generate_invoice(&manager(), claim.id).await.map(|_| ()).err(),
            h.workflow.delete(&manager(), claim.id).await.err(),
            h.workflow.submit(&hr(), &submission()).await.map(|_| ()).err(),
        ];

        for result in results {
            assert!(matches!(result, Some(ClaimError::NotPermitted { .. })));
        }
        assert_eq!(h.store.all().await, before);
    }

    #[tokio::test]
    async fn test_not_permitted_checked_before_lookup() {
        let h = harness();
        let err = h.workflow.approve(&hr(), ClaimId::new(1)).await.unwrap_err();
        assert!(matches!(
            err,
            ClaimError::NotPermitted { operation: Operation::Approve, .. }
        ));
    }

    #[tokio::test]
    async fn test_details_open_to_every_role() {
        let h = harness();
        let claim = submitted(&h).await;
        for role in Role::ALL {
            let actor = Actor::new("someone@example.com", [role]);
            assert_eq!(h.workflow.details(&actor, claim.id).await.unwrap().id, claim.id);
        }
    }

    #[tokio::test]
    async fn test_multi_role_actor() {
        let h = harness();
        let both = Actor::new("both@example.com", [Role::Lecturer, Role::Manager]);
        let claim = h.workflow.submit(&both, &submission()).await.unwrap();
        assert!(h.workflow.approve(&both, claim.id).await.is_ok());
    }
}

// ============================================================================
// Concurrency Tests
// ============================================================================

mod concurrency_tests {
    use super::*;

    #[derive(Clone, Copy)]
    enum Interference {
        /// Another writer updates the row first
        Update,
        /// Another writer deletes the row first
        Delete,
    }

    /// Store that lets a competing write land just before each update
    struct RacingStore {
        inner: MockClaimStore,
        interference: Interference,
    }

    impl RacingStore {
        async fn interfere(&self, id: ClaimId) {
            match self.interference {
                Interference::Update => {
                    if let Some(current) = self.inner.get(id).await.unwrap() {
                        self.inner.update(&current).await.unwrap();
                    }
                }
                Interference::Delete => {
                    self.inner.delete(id).await.unwrap();
                }
            }
        }
    }

    impl DomainPort for RacingStore {}

    #[async_trait]
    impl HealthCheckable for RacingStore {
        async fn health_check(&self) -> HealthCheckResult {
            self.inner.health_check().await
        }
    }

    #[async_trait]
    impl ClaimStore for RacingStore {
        async fn insert(&self, claim: NewClaim) -> Result<Claim, PortError> {
            self.inner.insert(claim).await
        }

        async fn get(&self, id: ClaimId) -> Result<Option<Claim>, PortError> {
            self.inner.get(id).await
        }

        async fn find(&self, query: ClaimQuery) -> Result<Vec<Claim>, PortError> {
            self.inner.find(query).await
        }

        async fn update(&self, claim: &Claim) -> Result<Claim, PortError> {
            self.interfere(claim.id).await;
            self.inner.update(claim).await
        }

        async fn delete(&self, id: ClaimId) -> Result<Option<Claim>, PortError> {
            self.inner.delete(id).await
        }

        async fn exists(&self, id: ClaimId) -> Result<bool, PortError> {
            self.inner.exists(id).await
        }

        async fn record_invoice(
            &self,
            claim: &Claim,
            invoice: NewInvoice,
        ) -> Result<(Claim, Invoice), PortError> {
            self.interfere(claim.id).await;
            self.inner.record_invoice(claim, invoice).await
        }

        async fn invoice_for_claim(&self, id: ClaimId) -> Result<Option<Invoice>, PortError> {
            self.inner.invoice_for_claim(id).await
        }
    }

    async fn racing(interference: Interference) -> (ClaimWorkflow, Claim, Arc<MockAttachmentStorage>) {
        let inner = MockClaimStore::new();
        let claim = inner
            .insert(NewClaim::from_fields(
                submission().fields().unwrap(),
                LECTURER,
                None,
                Utc::now(),
            ))
            .await
            .unwrap();
        let store = Arc::new(RacingStore { inner, interference });
        let storage = Arc::new(MockAttachmentStorage::new());
        (ClaimWorkflow::new(store, storage.clone()), claim, storage)
    }

    fn edit(claim: &Claim) -> ClaimEdit {
        ClaimEdit {
            claim_id: claim.id,
            version: None,
            details: submission(),
        }
    }

    #[tokio::test]
    async fn test_edit_racing_update_is_conflict() {
        let (workflow, claim, _) = racing(Interference::Update).await;
        let err = workflow.edit(&lecturer(), claim.id, &edit(&claim)).await.unwrap_err();
        assert!(matches!(err, ClaimError::ConcurrencyConflict(_)));
    }

    #[tokio::test]
    async fn test_edit_racing_delete_is_not_found() {
        let (workflow, claim, _) = racing(Interference::Delete).await;
        let err = workflow.edit(&lecturer(), claim.id, &edit(&claim)).await.unwrap_err();
        assert!(matches!(err, ClaimError::ClaimNotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_edit_discards_new_upload() {
        let (workflow, claim, storage) = racing(Interference::Update).await;
        let mut edit = edit(&claim);
        edit.details.attachment = Some(Upload::new("new.pdf", vec![7; 16]));

        assert!(workflow.edit(&lecturer(), claim.id, &edit).await.is_err());
        assert_eq!(storage.file_count().await, 0);
    }

    #[tokio::test]
    async fn test_approve_racing_delete_is_not_found() {
        let (workflow, claim, _) = racing(Interference::Delete).await;
        let err = workflow.approve(&manager(), claim.id).await.unwrap_err();
        assert!(matches!(err, ClaimError::ClaimNotFound(_)));
    }
}

// ============================================================================
// Attachment Policy Properties
// ============================================================================

mod attachment_properties {
    use super::*;

    proptest! {
        #[test]
        fn size_above_limit_always_fails_first(extra in 1u64..10_000_000, name in "[a-z]{1,8}\\.[a-z]{0,5}") {
            let policy = AttachmentPolicy::default();
            let result = policy.check(&name, MAX_ATTACHMENT_BYTES + extra);
            let is_too_large = matches!(result, Err(AttachmentError::TooLarge { .. }));
            prop_assert!(is_too_large);
        }

        #[test]
        fn allowed_extension_any_case_is_accepted(
            stem in "[a-zA-Z0-9_-]{1,12}",
            ext in prop::sample::select(vec!["pdf", "docx", "xlsx", "png", "jpeg", "jpg"]),
            upper in any::<bool>(),
            size in 0u64..=MAX_ATTACHMENT_BYTES,
        ) {
            let ext = if upper { ext.to_uppercase() } else { ext.to_string() };
            let policy = AttachmentPolicy::default();
            let attachment = policy.prepare(&format!("{stem}.{ext}"), size).unwrap();
            let expected_suffix = format!(".{ext}");
            prop_assert!(attachment.storage_name.ends_with(&expected_suffix));
        }
    }
}

#[test]
fn test_ticking_clock_advances_one_minute() {
    let clock = ticking_clock();
    let first: DateTime<Utc> = clock();
    let second = clock();
    assert_eq!(second - first, Duration::minutes(1));
}
