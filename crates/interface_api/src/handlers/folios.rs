//! Folio and charge handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::{ChargeId, FolioId, ReservationId};
use domain_billing::{ChargeInput, LedgerKind};

use crate::auth::{permissions, Actor};
use crate::dto::folios::*;
use crate::dto::invoices::{DispatchResponse, InvoiceResponse};
use crate::{error::ApiError, AppState};

/// Opens the hotel folio of a reservation
pub async fn create_folio(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<CreateFolioRequest>,
) -> Result<(StatusCode, Json<FolioResponse>), ApiError> {
    let user = actor.require(permissions::LEDGER_WRITE)?;
    let folio = state
        .billing
        .create_folio(request.reservation_id, request.guest_id, user)
        .await?;
    Ok((StatusCode::CREATED, Json(folio.into())))
}

/// Gets a folio with its charges
pub async fn get_folio(
    State(state): State<AppState>,
    Extension(kind): Extension<LedgerKind>,
    actor: Actor,
    Path(folio_id): Path<FolioId>,
) -> Result<Json<FolioDetailResponse>, ApiError> {
    actor.require(permissions::LEDGER_READ)?;
    let detail = state.billing.get_folio(kind, folio_id).await?;
    Ok(Json(detail.into()))
}

/// Gets the hotel folio of a reservation
pub async fn get_reservation_folio(
    State(state): State<AppState>,
    actor: Actor,
    Path(reservation_id): Path<ReservationId>,
) -> Result<Json<FolioDetailResponse>, ApiError> {
    actor.require(permissions::LEDGER_READ)?;
    let detail = state.billing.get_folio_by_reservation(reservation_id).await?;
    Ok(Json(detail.into()))
}

/// Posts a charge
pub async fn post_charge(
    State(state): State<AppState>,
    Extension(kind): Extension<LedgerKind>,
    actor: Actor,
    Path(folio_id): Path<FolioId>,
    Json(request): Json<PostChargeRequest>,
) -> Result<(StatusCode, Json<ChargeResponse>), ApiError> {
    let user = actor.require(permissions::LEDGER_WRITE)?;
    request.validate()?;
    let charge = state
        .billing
        .post_charge(kind, folio_id, ChargeInput::from(request), user)
        .await?;
    Ok((StatusCode::CREATED, Json(charge.into())))
}

/// Posts an ad-hoc service charge
pub async fn post_service_charge(
    State(state): State<AppState>,
    Extension(kind): Extension<LedgerKind>,
    actor: Actor,
    Path(folio_id): Path<FolioId>,
    Json(request): Json<PostChargeRequest>,
) -> Result<(StatusCode, Json<ChargeResponse>), ApiError> {
    let user = actor.require(permissions::LEDGER_WRITE)?;
    request.validate()?;
    let charge = state
        .billing
        .post_service_charge(kind, folio_id, ChargeInput::from(request), user)
        .await?;
    Ok((StatusCode::CREATED, Json(charge.into())))
}

/// Posts a refund credit
pub async fn post_refund(
    State(state): State<AppState>,
    Extension(kind): Extension<LedgerKind>,
    actor: Actor,
    Path(folio_id): Path<FolioId>,
    Json(request): Json<RefundRequest>,
) -> Result<(StatusCode, Json<ChargeResponse>), ApiError> {
    let user = actor.require(permissions::LEDGER_WRITE)?;
    request.validate()?;
    let charge = state
        .billing
        .post_refund(kind, folio_id, request.amount, &request.description, user)
        .await?;
    Ok((StatusCode::CREATED, Json(charge.into())))
}

/// Reverses one charge
pub async fn reverse_charge(
    State(state): State<AppState>,
    Extension(kind): Extension<LedgerKind>,
    actor: Actor,
    Path((folio_id, charge_id)): Path<(FolioId, ChargeId)>,
    request: Option<Json<ReverseChargeRequest>>,
) -> Result<(StatusCode, Json<ChargeResponse>), ApiError> {
    let user = actor.require(permissions::LEDGER_WRITE)?;
    let request = request.map(|Json(r)| r).unwrap_or_default();
    request.validate()?;
    let reversal = state
        .billing
        .reverse_charge(kind, folio_id, charge_id, request.reason, user)
        .await?;
    Ok((StatusCode::CREATED, Json(reversal.into())))
}

/// Posts (or re-posts) the room nights of a reservation
pub async fn post_room_charges(
    State(state): State<AppState>,
    actor: Actor,
    Path(reservation_id): Path<ReservationId>,
) -> Result<Json<Vec<ChargeResponse>>, ApiError> {
    let user = actor.require(permissions::LEDGER_WRITE)?;
    let written = state.billing.post_room_stay_charges(reservation_id, user).await?;
    Ok(Json(written.into_iter().map(Into::into).collect()))
}

/// Recomputes and stores a folio's totals
pub async fn reconcile_folio(
    State(state): State<AppState>,
    Extension(kind): Extension<LedgerKind>,
    actor: Actor,
    Path(folio_id): Path<FolioId>,
) -> Result<Json<TotalsResponse>, ApiError> {
    actor.require(permissions::LEDGER_WRITE)?;
    let totals = state.billing.recompute_totals(kind, folio_id).await?;
    Ok(Json(totals.into()))
}

/// Generates the folio's invoice, or returns the one it already has
pub async fn generate_invoice(
    State(state): State<AppState>,
    Extension(kind): Extension<LedgerKind>,
    actor: Actor,
    Path(folio_id): Path<FolioId>,
) -> Result<(StatusCode, Json<InvoiceResponse>), ApiError> {
    let user = actor.require(permissions::INVOICE_ISSUE)?;
    let invoice = state.billing.generate_invoice(kind, folio_id, user).await?;
    Ok((StatusCode::CREATED, Json(invoice.into())))
}

/// Generates the invoice and hands it to the PDF and e-mail collaborator
pub async fn dispatch_invoice(
    State(state): State<AppState>,
    Extension(kind): Extension<LedgerKind>,
    actor: Actor,
    Path(folio_id): Path<FolioId>,
) -> Result<(StatusCode, Json<DispatchResponse>), ApiError> {
    let user = actor.require(permissions::INVOICE_ISSUE)?;
    let dispatch = state
        .billing
        .generate_and_dispatch_invoice(kind, folio_id, user)
        .await?;
    Ok((StatusCode::CREATED, Json(dispatch.into())))
}
