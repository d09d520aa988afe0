//! Payment DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{GuestId, InvoiceId, PaymentId};
use domain_billing::{
    FolioOwner, LedgerKind, Page, PageRequest, Payment, PaymentInput, PaymentMethod, PaymentStatus,
};

use super::positive_amount;

#[derive(Debug, Deserialize, Validate)]
pub struct PaymentRequest {
    #[validate(custom(function = "positive_amount"))]
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    #[validate(length(min = 1, max = 64, message = "Reference number must be 1-64 characters"))]
    pub reference_number: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
    pub guest_id: Option<GuestId>,
}

impl PaymentRequest {
    pub fn into_input(self) -> PaymentInput {
        let mut input = PaymentInput::new(self.amount, self.payment_method);
        input.reference_number = self.reference_number;
        input.payment_date = self.payment_date;
        input.notes = self.notes;
        input.guest_id = self.guest_id;
        input
    }

    /// An advance deposit against `owner`
    pub fn into_deposit(self, owner: FolioOwner) -> PaymentInput {
        self.into_input().for_owner(owner)
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: PaymentId,
    pub ledger: LedgerKind,
    pub invoice_id: Option<InvoiceId>,
    pub owner: FolioOwner,
    pub guest_id: Option<GuestId>,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub reference_number: String,
    pub payment_date: DateTime<Utc>,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            ledger: payment.kind,
            invoice_id: payment.invoice_id,
            owner: payment.owner,
            guest_id: payment.guest_id,
            amount: payment.amount.amount(),
            currency: payment.amount.currency().code().to_string(),
            payment_method: payment.payment_method,
            reference_number: payment.reference_number,
            payment_date: payment.payment_date,
            status: payment.status,
            notes: payment.notes,
        }
    }
}

/// Query string of the payment history endpoint
#[derive(Debug, Default, Deserialize, Validate)]
pub struct HistoryQuery {
    #[validate(range(min = 1, message = "Page starts at 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<u32>,
}

impl HistoryQuery {
    pub fn page_request(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest {
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl From<Page<Payment>> for PageResponse<PaymentResponse> {
    fn from(page: Page<Payment>) -> Self {
        Self {
            items: page.items.into_iter().map(Into::into).collect(),
            page: page.page,
            limit: page.limit,
            total: page.total,
            total_pages: page.total_pages,
        }
    }
}
