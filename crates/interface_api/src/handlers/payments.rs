//! Deposit, refund and payment history handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::{GuestId, PaymentId, ReservationId};
use domain_billing::{FolioOwner, LedgerKind};

use crate::auth::{permissions, Actor};
use crate::dto::payments::{HistoryQuery, PageResponse, PaymentRequest, PaymentResponse};
use crate::{error::ApiError, AppState};

/// Records an advance deposit on a reservation's hotel folio
pub async fn record_deposit(
    State(state): State<AppState>,
    actor: Actor,
    Path(reservation_id): Path<ReservationId>,
    Json(request): Json<PaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    let user = actor.require(permissions::PAYMENT_WRITE)?;
    request.validate()?;
    let input = request.into_deposit(FolioOwner::Reservation(reservation_id));
    let payment = state
        .billing
        .record_payment(LedgerKind::Hotel, None, input, user)
        .await?;
    Ok((StatusCode::CREATED, Json(payment.into())))
}

/// Refunds a completed payment
pub async fn refund_payment(
    State(state): State<AppState>,
    Extension(kind): Extension<LedgerKind>,
    actor: Actor,
    Path(payment_id): Path<PaymentId>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let user = actor.require(permissions::PAYMENT_REFUND)?;
    let payment = state.billing.refund_payment(kind, payment_id, user).await?;
    Ok(Json(payment.into()))
}

/// A guest's payments on this ledger, newest first
pub async fn guest_payment_history(
    State(state): State<AppState>,
    Extension(kind): Extension<LedgerKind>,
    actor: Actor,
    Path(guest_id): Path<GuestId>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<PageResponse<PaymentResponse>>, ApiError> {
    actor.require(permissions::LEDGER_READ)?;
    query.validate()?;
    let page = state
        .billing
        .get_guest_payment_history(kind, guest_id, query.page_request())
        .await?;
    Ok(Json(page.into()))
}
