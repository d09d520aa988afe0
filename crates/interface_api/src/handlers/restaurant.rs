//! Restaurant order handlers
//!
//! The restaurant subsystem sends the whole order on every call; the path
//! id must match the body's.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use core_kernel::OrderId;
use domain_billing::{FolioOwner, LedgerKind, RestaurantOrder};

use crate::auth::{permissions, Actor};
use crate::dto::folios::FolioDetailResponse;
use crate::dto::invoices::InvoiceResponse;
use crate::dto::payments::{PaymentRequest, PaymentResponse};
use crate::dto::restaurant::OrderPostingResponse;
use crate::{error::ApiError, AppState};

fn ensure_same_order(path_id: OrderId, order: &RestaurantOrder) -> Result<(), ApiError> {
    if order.id == path_id {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "order id {} in the body does not match {} in the path",
            order.id, path_id
        )))
    }
}

/// Posts a created or updated order to its folios
pub async fn sync_order(
    State(state): State<AppState>,
    actor: Actor,
    Path(order_id): Path<OrderId>,
    Json(order): Json<RestaurantOrder>,
) -> Result<Json<OrderPostingResponse>, ApiError> {
    let user = actor.require(permissions::LEDGER_WRITE)?;
    ensure_same_order(order_id, &order)?;
    let posting = state.billing.sync_restaurant_order(&order, user).await?;
    Ok(Json(posting.into()))
}

/// Reverses everything an order still has outstanding
pub async fn cancel_order(
    State(state): State<AppState>,
    actor: Actor,
    Path(order_id): Path<OrderId>,
    Json(order): Json<RestaurantOrder>,
) -> Result<Json<OrderPostingResponse>, ApiError> {
    let user = actor.require(permissions::LEDGER_WRITE)?;
    ensure_same_order(order_id, &order)?;
    let posting = state.billing.cancel_restaurant_order(&order, user).await?;
    Ok(Json(posting.into()))
}

/// Invoices a walk-in order on the restaurant ledger
pub async fn bill_order(
    State(state): State<AppState>,
    actor: Actor,
    Path(order_id): Path<OrderId>,
    Json(order): Json<RestaurantOrder>,
) -> Result<(StatusCode, Json<InvoiceResponse>), ApiError> {
    let user = actor.require(permissions::INVOICE_ISSUE)?;
    ensure_same_order(order_id, &order)?;
    let invoice = state.billing.bill_restaurant_order(&order, user).await?;
    Ok((StatusCode::CREATED, Json(invoice.into())))
}

/// Gets an order's restaurant folio
pub async fn get_order_folio(
    State(state): State<AppState>,
    actor: Actor,
    Path(order_id): Path<OrderId>,
) -> Result<Json<FolioDetailResponse>, ApiError> {
    actor.require(permissions::LEDGER_READ)?;
    let detail = state.billing.get_restaurant_folio(order_id).await?;
    Ok(Json(detail.into()))
}

/// Records an advance payment on an order's restaurant folio
pub async fn record_order_deposit(
    State(state): State<AppState>,
    actor: Actor,
    Path(order_id): Path<OrderId>,
    Json(request): Json<PaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    let user = actor.require(permissions::PAYMENT_WRITE)?;
    request.validate()?;
    let input = request.into_deposit(FolioOwner::RestaurantOrder(order_id));
    let payment = state
        .billing
        .record_payment(LedgerKind::Restaurant, None, input, user)
        .await?;
    Ok((StatusCode::CREATED, Json(payment.into())))
}
