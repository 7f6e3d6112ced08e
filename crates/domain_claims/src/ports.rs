//! Claims Domain Ports
//!
//! Port interfaces the claim workflow depends on:
//!
//! - [`ClaimStore`]: persistence of claims and their invoices
//!   (PostgreSQL in `infra_db`, in-memory [`mock::MockClaimStore`] for tests)
//! - [`AttachmentStorage`]: byte storage for supporting documents
//!   (local filesystem in `interface_api`, [`mock::MockAttachmentStorage`])
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_claims::ports::{ClaimStore, ClaimQuery};
//! use domain_claims::ClaimStatus;
//!
//! let pending = store
//!     .find(ClaimQuery::default().with_statuses([ClaimStatus::Pending]))
//!     .await?;
//! ```

use async_trait::async_trait;

use core_kernel::{ClaimId, DomainPort, HealthCheckable, PortError};

use crate::attachment::Attachment;
use crate::claim::{Claim, ClaimStatus, NewClaim};
use crate::invoice::{Invoice, NewInvoice};

/// Query parameters for finding claims
///
/// Empty filters match everything. Results are ordered by claim id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimQuery {
    /// Filter by submitter identity
    pub submitted_by: Option<String>,
    /// Filter by any of these statuses
    pub statuses: Vec<ClaimStatus>,
}

impl ClaimQuery {
    /// Creates a query for one submitter's claims
    pub fn owned_by(identity: impl Into<String>) -> Self {
        Self {
            submitted_by: Some(identity.into()),
            ..Default::default()
        }
    }

    /// Restricts the query to the given statuses
    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = ClaimStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    /// Evaluates the query against a claim in memory
    pub fn matches(&self, claim: &Claim) -> bool {
        if let Some(ref owner) = self.submitted_by {
            if &claim.submitted_by != owner {
                return false;
            }
        }
        self.statuses.is_empty() || self.statuses.contains(&claim.status())
    }
}

/// Persistence port for claims
#[async_trait]
pub trait ClaimStore: DomainPort + HealthCheckable {
    /// Inserts a new claim, assigning its id and initial version
    async fn insert(&self, claim: NewClaim) -> Result<Claim, PortError>;

    /// Retrieves a claim, `None` if absent
    async fn get(&self, id: ClaimId) -> Result<Option<Claim>, PortError>;

    /// Finds claims matching the query, ordered by id
    async fn find(&self, query: ClaimQuery) -> Result<Vec<Claim>, PortError>;

    /// Writes every column of `claim` if the stored version equals `claim.version`
    ///
    /// Returns the stored claim with its version bumped. A version mismatch, or
    /// a row that no longer exists, yields `PortError::Conflict`.
    async fn update(&self, claim: &Claim) -> Result<Claim, PortError>;

    /// Removes a claim, returning it if it existed
    async fn delete(&self, id: ClaimId) -> Result<Option<Claim>, PortError>;

    /// Whether a claim with this id exists
    async fn exists(&self, id: ClaimId) -> Result<bool, PortError>;

    /// Atomically writes the invoiced claim and records its invoice
    ///
    /// The claim write follows the `update` version rule. The invoice is only
    /// inserted when the claim has none yet; otherwise the existing invoice is
    /// returned unchanged.
    async fn record_invoice(
        &self,
        claim: &Claim,
        invoice: NewInvoice,
    ) -> Result<(Claim, Invoice), PortError>;

    /// Retrieves the invoice recorded for a claim
    async fn invoice_for_claim(&self, id: ClaimId) -> Result<Option<Invoice>, PortError>;
}

/// Byte storage for supporting documents
#[async_trait]
pub trait AttachmentStorage: DomainPort {
    /// Writes the bytes under the attachment's storage name
    async fn store(&self, attachment: &Attachment, bytes: &[u8]) -> Result<(), PortError>;

    /// Removes a stored attachment; removing a missing file succeeds
    async fn remove(&self, attachment: &Attachment) -> Result<(), PortError>;
}

/// In-memory implementations for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use chrono::Utc;

    use core_kernel::{AdapterHealth, HealthCheckResult, InvoiceId};

    /// In-memory mock implementation of ClaimStore
    #[derive(Debug, Default)]
    pub struct MockClaimStore {
        claims: Arc<RwLock<BTreeMap<ClaimId, Claim>>>,
        invoices: Arc<RwLock<BTreeMap<ClaimId, Invoice>>>,
        next_claim_id: AtomicI64,
        next_invoice_id: AtomicI64,
    }

    impl MockClaimStore {
        /// Creates a new mock store
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with claims for testing
        pub async fn with_claims(claims: Vec<Claim>) -> Self {
            let store = Self::new();
            {
                let mut stored = store.claims.write().await;
                for claim in claims {
                    store.next_claim_id.fetch_max(claim.id.value(), Ordering::SeqCst);
                    stored.insert(claim.id, claim);
                }
            }
            store
        }

        /// Number of stored claims
        pub async fn len(&self) -> usize {
            self.claims.read().await.len()
        }

        pub async fn is_empty(&self) -> bool {
            self.claims.read().await.is_empty()
        }

        /// Snapshot of every stored claim in id order
        pub async fn all(&self) -> Vec<Claim> {
            self.claims.read().await.values().cloned().collect()
        }

        /// Number of recorded invoices
        pub async fn invoice_count(&self) -> usize {
            self.invoices.read().await.len()
        }
    }

    impl DomainPort for MockClaimStore {}

    #[async_trait]
    impl HealthCheckable for MockClaimStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-claim-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    fn stale(id: ClaimId) -> PortError {
        PortError::conflict(format!("claim {id} was modified or removed"))
    }

    fn write_versioned(
        claims: &mut BTreeMap<ClaimId, Claim>,
        claim: &Claim,
    ) -> Result<Claim, PortError> {
        match claims.get(&claim.id) {
            Some(current) if current.version == claim.version => {}
            _ => return Err(stale(claim.id)),
        }
        let mut stored = claim.clone();
        stored.version += 1;
        claims.insert(stored.id, stored.clone());
        Ok(stored)
    }

    #[async_trait]
    impl ClaimStore for MockClaimStore {
        async fn insert(&self, claim: NewClaim) -> Result<Claim, PortError> {
            let id = ClaimId::new(self.next_claim_id.fetch_add(1, Ordering::SeqCst) + 1);
            let claim = claim.into_claim(id);
            self.claims.write().await.insert(id, claim.clone());
            Ok(claim)
        }

        async fn get(&self, id: ClaimId) -> Result<Option<Claim>, PortError> {
            Ok(self.claims.read().await.get(&id).cloned())
        }

        async fn find(&self, query: ClaimQuery) -> Result<Vec<Claim>, PortError> {
            Ok(self
                .claims
                .read()
                .await
                .values()
                .filter(|claim| query.matches(claim))
                .cloned()
                .collect())
        }

        async fn update(&self, claim: &Claim) -> Result<Claim, PortError> {
            let mut claims = self.claims.write().await;
            write_versioned(&mut claims, claim)
        }

        async fn delete(&self, id: ClaimId) -> Result<Option<Claim>, PortError> {
            Ok(self.claims.write().await.remove(&id))
        }

        async fn exists(&self, id: ClaimId) -> Result<bool, PortError> {
            Ok(self.claims.read().await.contains_key(&id))
        }

        async fn record_invoice(
            &self,
            claim: &Claim,
            invoice: NewInvoice,
        ) -> Result<(Claim, Invoice), PortError> {
            // Both maps are held for the whole write so it stays atomic.
            let mut claims = self.claims.write().await;
            let mut invoices = self.invoices.write().await;

            let stored = write_versioned(&mut claims, claim)?;
            let invoice = match invoices.get(&claim.id) {
                Some(existing) => existing.clone(),
                None => {
                    let id = InvoiceId::new(self.next_invoice_id.fetch_add(1, Ordering::SeqCst) + 1);
                    let invoice = invoice.into_invoice(id);
                    invoices.insert(claim.id, invoice.clone());
                    invoice
                }
            };
            Ok((stored, invoice))
        }

        async fn invoice_for_claim(&self, id: ClaimId) -> Result<Option<Invoice>, PortError> {
            Ok(self.invoices.read().await.get(&id).cloned())
        }
    }

    /// In-memory mock implementation of AttachmentStorage
    #[derive(Debug, Default)]
    pub struct MockAttachmentStorage {
        files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
        fail_writes: AtomicBool,
    }

    impl MockAttachmentStorage {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every subsequent `store` call fail
        pub fn fail_writes(&self) {
            self.fail_writes.store(true, Ordering::SeqCst);
        }

        pub async fn contains(&self, storage_name: &str) -> bool {
            self.files.read().await.contains_key(storage_name)
        }

        pub async fn file_count(&self) -> usize {
            self.files.read().await.len()
        }
    }

    impl DomainPort for MockAttachmentStorage {}

    #[async_trait]
    impl AttachmentStorage for MockAttachmentStorage {
        async fn store(&self, attachment: &Attachment, bytes: &[u8]) -> Result<(), PortError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(PortError::internal("mock storage refused the write"));
            }
            self.files
                .write()
                .await
                .insert(attachment.storage_name.clone(), bytes.to_vec());
            Ok(())
        }

        async fn remove(&self, attachment: &Attachment) -> Result<(), PortError> {
            self.files.write().await.remove(&attachment.storage_name);
            Ok(())
        }
    }
}
