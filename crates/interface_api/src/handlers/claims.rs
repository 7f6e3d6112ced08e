//! Claims handlers
//!
//! Thin translation between HTTP and [`ClaimWorkflow`](domain_claims::ClaimWorkflow):
//! each handler extracts the caller's [`Claims`], converts the request into
//! domain input and maps the result into a response DTO. Authorization is
//! enforced by the workflow; form handlers check the role before reading the
//! body so a caller without it gets 403 rather than a validation error.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::debug;
use validator::Validate;

use core_kernel::ClaimId;
use domain_claims::attachment::ATTACHMENT_FIELD;
use domain_claims::{Claim, Operation, Upload};

use crate::auth::Claims;
use crate::dto::claims::*;
use crate::{error::ApiError, AppState};

fn respond(claims: Vec<Claim>) -> Json<Vec<ClaimResponse>> {
    Json(claims.into_iter().map(ClaimResponse::from).collect())
}

/// Reads a claim form: text fields plus an optional `attachment` file part
async fn parse_claim_multipart(
    mut multipart: Multipart,
) -> Result<(ClaimForm, Option<Upload>), ApiError> {
    let mut form = ClaimForm::default();
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == ATTACHMENT_FIELD {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            debug!(file_name = %file_name, size = bytes.len(), "Received attachment");
            upload = Some(Upload::new(file_name, bytes.to_vec()));
        } else {
            let value = field.text().await?;
            form.set(&name, value);
        }
    }

    Ok((form, upload))
}

/// Lists the caller's own claims
pub async fn list_own(
    State(state): State<AppState>,
    Extension(user): Extension<Claims>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    Ok(respond(state.workflow.list_own(&user).await?))
}

/// Submits a new claim
pub async fn submit(
    State(state): State<AppState>,
    Extension(user): Extension<Claims>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ClaimResponse>), ApiError> {
    state.workflow.authorize(&user, Operation::Submit)?;

    let (form, upload) = parse_claim_multipart(multipart).await?;
    let submission = form.into_submission(upload)?;

    let claim = state.workflow.submit(&user, &submission).await?;
    Ok((StatusCode::CREATED, Json(claim.into())))
}

/// Lists claims awaiting review
pub async fn list_pending(
    State(state): State<AppState>,
    Extension(user): Extension<Claims>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    Ok(respond(state.workflow.list_pending(&user).await?))
}

/// Lists reviewed claims
pub async fn list_history(
    State(state): State<AppState>,
    Extension(user): Extension<Claims>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    Ok(respond(state.workflow.list_history(&user).await?))
}

/// Lists approved claims still waiting for an invoice
pub async fn list_approved(
    State(state): State<AppState>,
    Extension(user): Extension<Claims>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    Ok(respond(state.workflow.list_approved_uninvoiced(&user).await?))
}

/// Lists invoiced claims
pub async fn list_invoiced(
    State(state): State<AppState>,
    Extension(user): Extension<Claims>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    Ok(respond(state.workflow.list_generated_invoices(&user).await?))
}

/// Gets a claim by ID
pub async fn get_claim(
    State(state): State<AppState>,
    Extension(user): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state.workflow.details(&user, ClaimId::new(id)).await?;
    Ok(Json(claim.into()))
}

/// Replaces the editable fields of a claim
pub async fn edit(
    State(state): State<AppState>,
    Extension(user): Extension<Claims>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<ClaimResponse>, ApiError> {
    state.workflow.authorize(&user, Operation::Edit)?;

    let id = ClaimId::new(id);
    let (form, upload) = parse_claim_multipart(multipart).await?;
    let edit = form.into_edit(id, upload)?;

    let claim = state.workflow.edit(&user, id, &edit).await?;
    Ok(Json(claim.into()))
}

/// Deletes a claim
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.workflow.delete(&user, ClaimId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Approves a pending claim
pub async fn approve(
    State(state): State<AppState>,
    Extension(user): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state.workflow.approve(&user, ClaimId::new(id)).await?;
    Ok(Json(claim.into()))
}

/// Rejects a pending claim
pub async fn reject(
    State(state): State<AppState>,
    Extension(user): Extension<Claims>,
    Path(id): Path<i64>,
    Json(request): Json<RejectRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    request.validate()?;
    let claim = state
        .workflow
        .reject(&user, ClaimId::new(id), &request.comment)
        .await?;
    Ok(Json(claim.into()))
}

/// Generates the invoice for an approved claim
pub async fn generate_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<GenerateInvoiceResponse>, ApiError> {
    let (claim, invoice) = state.workflow.generate_invoice(&user, ClaimId::new(id)).await?;
    Ok(Json(GenerateInvoiceResponse {
        claim: claim.into(),
        invoice: invoice.into(),
    }))
}

/// Gets the invoice recorded for a claim
pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice = state.workflow.invoice_for(&user, ClaimId::new(id)).await?;
    Ok(Json(invoice.into()))
}
