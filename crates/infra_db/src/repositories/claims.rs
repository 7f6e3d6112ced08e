//! Claims repository implementation
//!
//! SQL access for the `claims` and `invoices` tables. Rows are mapped with
//! `sqlx::FromRow`; conversion to and from the domain types lives here too so
//! the adapter only deals in domain values.
//!
//! Every write to `claims` is versioned:
//!
//! ```sql
//! UPDATE claims SET ..., version = version + 1
//! WHERE claim_id = $1 AND version = $2
//! ```
//!
//! A write that matches no row fails with [`DatabaseError::StaleVersion`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};

use core_kernel::{Amount, ClaimId, InvoiceId};
use domain_claims::{Attachment, Claim, ClaimState, ClaimStatus, Invoice, NewClaim, NewInvoice};

use crate::error::DatabaseError;

const CLAIM_COLUMNS: &str = r#"
    claim_id, lecturer_id, submitted_by,
    hours_worked, hourly_rate, total_amount,
    status, submitted_at, approval_date, invoice_generated,
    approval_by, comments, notes, document_type,
    original_file_name, storage_name, image_url, version
"#;

const INVOICE_COLUMNS: &str = "invoice_id, claim_id, generated_by, generated_at, invoice_number";

/// Repository for managing claims data
#[derive(Debug, Clone)]
pub struct ClaimsRepository {
    pool: PgPool,
}

impl ClaimsRepository {
    /// Creates a new ClaimsRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a new claim in Pending status
    pub async fn insert(&self, claim: &NewClaim) -> Result<ClaimRow, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO claims (
                lecturer_id, submitted_by, hours_worked, hourly_rate, total_amount,
                status, submitted_at, notes, document_type,
                original_file_name, storage_name, image_url
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {CLAIM_COLUMNS}
            "#
        );
        let attachment = claim.attachment.as_ref();

        let row = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(&claim.lecturer_id)
            .bind(&claim.submitted_by)
            .bind(claim.hours_worked.value())
            .bind(claim.hourly_rate.value())
            .bind(claim.total_amount.value())
            .bind(ClaimStatus::Pending.as_str())
            .bind(claim.submitted_at)
            .bind(&claim.notes)
            .bind(&claim.document_type)
            .bind(attachment.map(|a| a.original_file_name.as_str()))
            .bind(attachment.map(|a| a.storage_name.as_str()))
            .bind(attachment.map(|a| a.url.as_str()))
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    /// Retrieves a claim by its identifier
    pub async fn get_by_id(&self, claim_id: i64) -> Result<Option<ClaimRow>, DatabaseError> {
        let sql = format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE claim_id = $1");
        let row = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(claim_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Finds claims by owner and status, ordered by id
    ///
    /// `None` owner and an empty status list each match everything.
    pub async fn find(
        &self,
        submitted_by: Option<&str>,
        statuses: &[String],
    ) -> Result<Vec<ClaimRow>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT {CLAIM_COLUMNS} FROM claims
            WHERE ($1::TEXT IS NULL OR submitted_by = $1)
              AND (cardinality($2::TEXT[]) = 0 OR status = ANY($2))
            ORDER BY claim_id
            "#
        );
        let rows = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(submitted_by)
            .bind(statuses)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Writes a claim if its stored version still matches
    pub async fn update(&self, row: &ClaimRow) -> Result<ClaimRow, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        update_versioned(&mut conn, row).await
    }

    /// Deletes a claim, returning the removed row
    pub async fn delete(&self, claim_id: i64) -> Result<Option<ClaimRow>, DatabaseError> {
        let sql = format!("DELETE FROM claims WHERE claim_id = $1 RETURNING {CLAIM_COLUMNS}");
        let row = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(claim_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn exists(&self, claim_id: i64) -> Result<bool, DatabaseError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM claims WHERE claim_id = $1)",
        )
        .bind(claim_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Stamps the claim and records its invoice in one transaction
    ///
    /// The invoice insert is skipped when the claim already has one; the
    /// existing invoice is returned instead.
    pub async fn record_invoice(
        &self,
        row: &ClaimRow,
        invoice: &NewInvoice,
    ) -> Result<(ClaimRow, InvoiceRow), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let claim = update_versioned(&mut tx, row).await?;

        let inserted = sqlx::query_as::<_, InvoiceRow>(&format!(
            r#"
            INSERT INTO invoices (claim_id, generated_by, generated_at, invoice_number)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (claim_id) DO NOTHING
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(invoice.claim_id.value())
        .bind(&invoice.generated_by)
        .bind(invoice.generated_at)
        .bind(&invoice.invoice_number)
        .fetch_optional(&mut *tx)
        .await?;

        let invoice = match inserted {
            Some(invoice) => invoice,
            None => {
                sqlx::query_as::<_, InvoiceRow>(&format!(
                    "SELECT {INVOICE_COLUMNS} FROM invoices WHERE claim_id = $1"
                ))
                .bind(row.claim_id)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        Ok((claim, invoice))
    }

    /// Retrieves the invoice recorded for a claim
    pub async fn invoice_for_claim(&self, claim_id: i64) -> Result<Option<InvoiceRow>, DatabaseError> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE claim_id = $1"
        ))
        .bind(claim_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Round-trips a trivial query
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

async fn update_versioned(conn: &mut PgConnection, row: &ClaimRow) -> Result<ClaimRow, DatabaseError> {
    let sql = format!(
        r#"
        UPDATE claims SET
            lecturer_id = $3,
            hours_worked = $4,
            hourly_rate = $5,
            total_amount = $6,
            status = $7,
            submitted_at = $8,
            approval_date = $9,
            invoice_generated = $10,
            approval_by = $11,
            comments = $12,
            notes = $13,
            document_type = $14,
            original_file_name = $15,
            storage_name = $16,
            image_url = $17,
            version = version + 1
        WHERE claim_id = $1 AND version = $2
        RETURNING {CLAIM_COLUMNS}
        "#
    );

    sqlx::query_as::<_, ClaimRow>(&sql)
        .bind(row.claim_id)
        .bind(row.version)
        .bind(&row.lecturer_id)
        .bind(row.hours_worked)
        .bind(row.hourly_rate)
        .bind(row.total_amount)
        .bind(&row.status)
        .bind(row.submitted_at)
        .bind(row.approval_date)
        .bind(row.invoice_generated)
        .bind(&row.approval_by)
        .bind(&row.comments)
        .bind(&row.notes)
        .bind(&row.document_type)
        .bind(&row.original_file_name)
        .bind(&row.storage_name)
        .bind(&row.image_url)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DatabaseError::stale("Claim", row.claim_id, row.version))
}

/// Database row for a claim
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ClaimRow {
    pub claim_id: i64,
    pub lecturer_id: String,
    pub submitted_by: String,
    pub hours_worked: Decimal,
    pub hourly_rate: Decimal,
    pub total_amount: Decimal,
    pub status: String,
    pub submitted_at: DateTime<Utc>,
    pub approval_date: Option<DateTime<Utc>>,
    pub invoice_generated: Option<DateTime<Utc>>,
    pub approval_by: Option<String>,
    pub comments: String,
    pub notes: String,
    pub document_type: String,
    pub original_file_name: Option<String>,
    pub storage_name: Option<String>,
    pub image_url: Option<String>,
    pub version: i32,
}

impl From<&Claim> for ClaimRow {
    fn from(claim: &Claim) -> Self {
        let attachment = claim.attachment.as_ref();
        Self {
            claim_id: claim.id.value(),
            lecturer_id: claim.lecturer_id.clone(),
            submitted_by: claim.submitted_by.clone(),
            hours_worked: claim.hours_worked.value(),
            hourly_rate: claim.hourly_rate.value(),
            total_amount: claim.total_amount.value(),
            status: claim.status().as_str().to_string(),
            submitted_at: claim.submitted_at,
            approval_date: claim.approval_date(),
            invoice_generated: claim.invoice_generated(),
            approval_by: claim.approval_by.clone(),
            comments: claim.comments().to_string(),
            notes: claim.notes.clone(),
            document_type: claim.document_type.clone(),
            original_file_name: attachment.map(|a| a.original_file_name.clone()),
            storage_name: attachment.map(|a| a.storage_name.clone()),
            image_url: attachment.map(|a| a.url.clone()),
            version: claim.version,
        }
    }
}

impl TryFrom<ClaimRow> for Claim {
    type Error = DatabaseError;

    fn try_from(row: ClaimRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str| {
            DatabaseError::SerializationError(format!("claim {}: {}", row.claim_id, what))
        };

        let status: ClaimStatus = row
            .status
            .parse()
            .map_err(|_| corrupt(&format!("unknown status '{}'", row.status)))?;
        let state = ClaimState::from_columns(
            status,
            row.approval_date,
            row.invoice_generated,
            &row.comments,
        )
        .ok_or_else(|| corrupt("status timestamps missing"))?;

        let amount = |value: Decimal, field: &str| {
            Amount::new(value).map_err(|e| corrupt(&format!("{field}: {e}")))
        };

        let attachment = match (row.storage_name.clone(), row.image_url.clone()) {
            (Some(storage_name), Some(url)) => Some(Attachment {
                original_file_name: row.original_file_name.clone().unwrap_or_default(),
                storage_name,
                url,
            }),
            _ => None,
        };

        Ok(Claim {
            id: ClaimId::new(row.claim_id),
            hours_worked: amount(row.hours_worked, "hours_worked")?,
            hourly_rate: amount(row.hourly_rate, "hourly_rate")?,
            total_amount: amount(row.total_amount, "total_amount")?,
            state,
            attachment,
            lecturer_id: row.lecturer_id,
            submitted_by: row.submitted_by,
            submitted_at: row.submitted_at,
            document_type: row.document_type,
            approval_by: row.approval_by,
            notes: row.notes,
            version: row.version,
        })
    }
}

/// Database row for an invoice
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct InvoiceRow {
    pub invoice_id: i64,
    pub claim_id: i64,
    pub generated_by: String,
    pub generated_at: DateTime<Utc>,
    pub invoice_number: String,
}

impl From<InvoiceRow> for Invoice {
    fn from(row: InvoiceRow) -> Self {
        Invoice {
            id: InvoiceId::new(row.invoice_id),
            claim_id: ClaimId::new(row.claim_id),
            generated_by: row.generated_by,
            generated_at: row.generated_at,
            invoice_number: row.invoice_number,
        }
    }
}
