//! Invoice DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use core_kernel::{ChargeId, FolioId, GuestId, InvoiceId};
use domain_billing::{
    ChargeType, GuestSummary, Invoice, InvoiceDetail, InvoiceDispatch, InvoiceItem, InvoiceStatus,
    LedgerKind, ReservationSummary,
};

use super::payments::PaymentResponse;

#[derive(Debug, Serialize)]
pub struct InvoiceItemResponse {
    pub charge_id: ChargeId,
    pub charge_type: ChargeType,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total_price: Decimal,
}

impl From<InvoiceItem> for InvoiceItemResponse {
    fn from(item: InvoiceItem) -> Self {
        Self {
            charge_id: item.charge_id,
            charge_type: item.charge_type,
            description: item.description,
            quantity: item.quantity,
            unit_price: item.unit_price.amount(),
            amount: item.amount.amount(),
            tax_rate: item.tax_rate,
            tax_amount: item.tax_amount.amount(),
            total_price: item.total_price.amount(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: InvoiceId,
    pub ledger: LedgerKind,
    pub invoice_number: String,
    pub folio_id: FolioId,
    pub guest_id: Option<GuestId>,
    pub currency: String,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub balance_amount: Decimal,
    pub status: InvoiceStatus,
    pub invoice_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub items: Vec<InvoiceItemResponse>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id,
            ledger: invoice.kind,
            invoice_number: invoice.invoice_number,
            folio_id: invoice.folio_id,
            guest_id: invoice.guest_id,
            currency: invoice.currency.code().to_string(),
            subtotal: invoice.subtotal.amount(),
            tax_amount: invoice.tax_amount.amount(),
            total_amount: invoice.total_amount.amount(),
            paid_amount: invoice.paid_amount.amount(),
            balance_amount: invoice.balance_amount.amount(),
            status: invoice.status,
            invoice_date: invoice.invoice_date,
            due_date: invoice.due_date,
            items: invoice.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceDetailResponse {
    pub invoice: InvoiceResponse,
    pub payments: Vec<PaymentResponse>,
    pub reservation: Option<ReservationSummary>,
    pub guest: Option<GuestSummary>,
}

impl From<InvoiceDetail> for InvoiceDetailResponse {
    fn from(detail: InvoiceDetail) -> Self {
        Self {
            invoice: detail.invoice.into(),
            payments: detail.payments.into_iter().map(Into::into).collect(),
            reservation: detail.reservation,
            guest: detail.guest,
        }
    }
}

/// Result of generating an invoice and handing it to the notifier
#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub detail: InvoiceDetailResponse,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_error: Option<String>,
}

impl From<InvoiceDispatch> for DispatchResponse {
    fn from(dispatch: InvoiceDispatch) -> Self {
        Self {
            delivered: dispatch.delivered(),
            notification_error: dispatch.notification_error,
            detail: dispatch.detail.into(),
        }
    }
}
