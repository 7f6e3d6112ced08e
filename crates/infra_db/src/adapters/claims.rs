//! PostgreSQL Claim Store Adapter
//!
//! This module provides the PostgreSQL implementation of the `ClaimStore`
//! port, backed by [`ClaimsRepository`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use infra_db::adapters::PgClaimStore;
//! use domain_claims::ClaimWorkflow;
//!
//! let store = Arc::new(PgClaimStore::new(pool));
//! let workflow = ClaimWorkflow::new(store, storage);
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, ClaimId, DomainPort, HealthCheckResult, HealthCheckable, PortError,
};
use domain_claims::{Claim, ClaimQuery, ClaimStore, Invoice, NewClaim, NewInvoice};

use crate::repositories::claims::{ClaimRow, ClaimsRepository};

const ADAPTER_ID: &str = "postgres-claim-store";

/// PostgreSQL-backed implementation of the ClaimStore trait
///
/// # Error Handling
///
/// Database errors are translated to `PortError` variants:
/// - stale version -> `PortError::Conflict`
/// - connection problems -> `PortError::Connection`
/// - other errors -> `PortError::Internal`
#[derive(Debug, Clone)]
pub struct PgClaimStore {
    repository: ClaimsRepository,
}

impl PgClaimStore {
    /// Creates a new PostgreSQL claim store
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ClaimsRepository::new(pool),
        }
    }

    /// Returns a reference to the underlying repository
    pub fn repository(&self) -> &ClaimsRepository {
        &self.repository
    }
}

fn to_claim(row: ClaimRow) -> Result<Claim, PortError> {
    Claim::try_from(row).map_err(PortError::from)
}

fn to_claims(rows: Vec<ClaimRow>) -> Result<Vec<Claim>, PortError> {
    rows.into_iter().map(to_claim).collect()
}

// Mark as a domain port
impl DomainPort for PgClaimStore {}

#[async_trait]
impl HealthCheckable for PgClaimStore {
    /// Checks database connectivity with a `SELECT 1`
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let result = self.repository.ping().await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(()) => (AdapterHealth::Healthy, None),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
        };

        HealthCheckResult {
            adapter_id: ADAPTER_ID.to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl ClaimStore for PgClaimStore {
    #[instrument(skip(self, claim), fields(submitted_by = %claim.submitted_by))]
    async fn insert(&self, claim: NewClaim) -> Result<Claim, PortError> {
        debug!("Inserting claim");
        let row = self.repository.insert(&claim).await?;
        to_claim(row)
    }

    #[instrument(skip(self), fields(claim_id = %id))]
    async fn get(&self, id: ClaimId) -> Result<Option<Claim>, PortError> {
        debug!("Fetching claim by ID");
        self.repository
            .get_by_id(id.value())
            .await?
            .map(to_claim)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn find(&self, query: ClaimQuery) -> Result<Vec<Claim>, PortError> {
        debug!("Finding claims with query: {:?}", query);
        let statuses: Vec<String> = query
            .statuses
            .iter()
            .map(|status| status.as_str().to_string())
            .collect();
        let rows = self
            .repository
            .find(query.submitted_by.as_deref(), &statuses)
            .await?;
        to_claims(rows)
    }

    #[instrument(skip(self, claim), fields(claim_id = %claim.id, version = claim.version))]
    async fn update(&self, claim: &Claim) -> Result<Claim, PortError> {
        let row = self.repository.update(&ClaimRow::from(claim)).await?;
        to_claim(row)
    }

    #[instrument(skip(self), fields(claim_id = %id))]
    async fn delete(&self, id: ClaimId) -> Result<Option<Claim>, PortError> {
        self.repository
            .delete(id.value())
            .await?
            .map(to_claim)
            .transpose()
    }

    async fn exists(&self, id: ClaimId) -> Result<bool, PortError> {
        Ok(self.repository.exists(id.value()).await?)
    }

    #[instrument(skip(self, claim, invoice), fields(claim_id = %claim.id))]
    async fn record_invoice(
        &self,
        claim: &Claim,
        invoice: NewInvoice,
    ) -> Result<(Claim, Invoice), PortError> {
        let (row, invoice) = self
            .repository
            .record_invoice(&ClaimRow::from(claim), &invoice)
            .await?;
        Ok((to_claim(row)?, invoice.into()))
    }

    #[instrument(skip(self), fields(claim_id = %id))]
    async fn invoice_for_claim(&self, id: ClaimId) -> Result<Option<Invoice>, PortError> {
        let row = self
            .repository
            .invoice_for_claim(id.value())
            .await?;
        Ok(row.map(Invoice::from))
    }
}
