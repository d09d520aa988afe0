//! Folio and charge DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{ChargeId, FolioId, GuestId, ReservationId, UserId};
use domain_billing::{
    ChargeInput, ChargeSource, ChargeType, Folio, FolioCharge, FolioDetail, FolioOwner,
    FolioStatus, FolioTotals, GuestSummary, LedgerKind, ReservationSummary,
};

use super::positive_amount;

#[derive(Debug, Deserialize)]
pub struct CreateFolioRequest {
    pub reservation_id: ReservationId,
    pub guest_id: GuestId,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PostChargeRequest {
    pub charge_type: ChargeType,
    #[validate(length(min = 1, max = 255, message = "Description must be 1-255 characters"))]
    pub description: String,
    pub unit_price: Decimal,
    pub quantity: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub is_taxable: Option<bool>,
    pub tax_rate: Option<Decimal>,
    pub charge_date: Option<DateTime<Utc>>,
    pub details: Option<serde_json::Value>,
}

impl From<PostChargeRequest> for ChargeInput {
    fn from(request: PostChargeRequest) -> Self {
        let mut input = ChargeInput::new(request.charge_type, request.description, request.unit_price);
        if let Some(quantity) = request.quantity {
            input = input.with_quantity(quantity);
        }
        if let Some(discount) = request.discount {
            input = input.with_discount(discount);
        }
        if let Some(is_taxable) = request.is_taxable {
            input = input.taxable(is_taxable);
        }
        if let Some(rate) = request.tax_rate {
            input = input.with_tax_rate(rate);
        }
        if let Some(date) = request.charge_date {
            input = input.on(date);
        }
        if let Some(details) = request.details {
            input = input.with_details(details);
        }
        input
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefundRequest {
    #[validate(custom(function = "positive_amount"))]
    pub amount: Decimal,
    #[validate(length(min = 1, max = 255, message = "Description must be 1-255 characters"))]
    pub description: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ReverseChargeRequest {
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FolioResponse {
    pub id: FolioId,
    pub ledger: LedgerKind,
    pub owner: FolioOwner,
    pub guest_id: Option<GuestId>,
    pub status: FolioStatus,
    pub currency: String,
    pub total_charges: Decimal,
    pub total_tax: Decimal,
    pub total_payments: Decimal,
    pub balance: Decimal,
    pub opened_date: DateTime<Utc>,
    pub closed_date: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<Folio> for FolioResponse {
    fn from(folio: Folio) -> Self {
        Self {
            id: folio.id,
            ledger: folio.kind(),
            owner: folio.owner,
            guest_id: folio.guest_id,
            status: folio.status,
            currency: folio.currency.code().to_string(),
            total_charges: folio.total_charges.amount(),
            total_tax: folio.total_tax.amount(),
            total_payments: folio.total_payments.amount(),
            balance: folio.balance.amount(),
            opened_date: folio.opened_date,
            closed_date: folio.closed_date,
            updated_at: folio.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChargeResponse {
    pub id: ChargeId,
    pub folio_id: FolioId,
    pub charge_type: ChargeType,
    pub description: String,
    pub unit_price: Decimal,
    pub quantity: Decimal,
    pub discount: Decimal,
    pub amount: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub is_taxable: bool,
    pub charge_date: DateTime<Utc>,
    pub posted_by: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ChargeSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverses_charge_id: Option<ChargeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<FolioCharge> for ChargeResponse {
    fn from(charge: FolioCharge) -> Self {
        Self {
            id: charge.id,
            folio_id: charge.folio_id,
            charge_type: charge.charge_type,
            description: charge.description,
            unit_price: charge.unit_price.amount(),
            quantity: charge.quantity,
            discount: charge.discount.amount(),
            amount: charge.amount.amount(),
            tax_rate: charge.tax_rate,
            tax_amount: charge.tax_amount.amount(),
            total_amount: charge.total_amount.amount(),
            is_taxable: charge.is_taxable,
            charge_date: charge.charge_date,
            posted_by: charge.posted_by,
            source: charge.source,
            reverses_charge_id: charge.reverses_charge_id,
            details: charge.details,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FolioDetailResponse {
    pub folio: FolioResponse,
    pub charges: Vec<ChargeResponse>,
    pub reservation: Option<ReservationSummary>,
    pub guest: Option<GuestSummary>,
}

impl From<FolioDetail> for FolioDetailResponse {
    fn from(detail: FolioDetail) -> Self {
        Self {
            folio: detail.folio.into(),
            charges: detail.charges.into_iter().map(Into::into).collect(),
            reservation: detail.reservation,
            guest: detail.guest,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TotalsResponse {
    pub total_charges: Decimal,
    pub total_tax: Decimal,
    pub total_payments: Decimal,
    pub balance: Decimal,
}

impl From<FolioTotals> for TotalsResponse {
    fn from(totals: FolioTotals) -> Self {
        Self {
            total_charges: totals.total_charges.amount(),
            total_tax: totals.total_tax.amount(),
            total_payments: totals.total_payments.amount(),
            balance: totals.balance.amount(),
        }
    }
}
