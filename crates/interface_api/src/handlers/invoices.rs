//! Invoice handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::InvoiceId;
use domain_billing::LedgerKind;

use crate::auth::{permissions, Actor};
use crate::dto::invoices::InvoiceDetailResponse;
use crate::dto::payments::{PaymentRequest, PaymentResponse};
use crate::{error::ApiError, AppState};

/// Gets an invoice with its items, payments, reservation and guest
pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(kind): Extension<LedgerKind>,
    actor: Actor,
    Path(invoice_id): Path<InvoiceId>,
) -> Result<Json<InvoiceDetailResponse>, ApiError> {
    actor.require(permissions::LEDGER_READ)?;
    let detail = state.billing.get_invoice_details(kind, invoice_id).await?;
    Ok(Json(detail.into()))
}

/// Records a payment against an invoice
pub async fn record_payment(
    State(state): State<AppState>,
    Extension(kind): Extension<LedgerKind>,
    actor: Actor,
    Path(invoice_id): Path<InvoiceId>,
    Json(request): Json<PaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    let user = actor.require(permissions::PAYMENT_WRITE)?;
    request.validate()?;
    let payment = state
        .billing
        .record_payment(kind, Some(invoice_id), request.into_input(), user)
        .await?;
    Ok((StatusCode::CREATED, Json(payment.into())))
}
