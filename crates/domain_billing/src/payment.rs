//! Payments
//!
//! A payment is a settlement record, not a gateway transaction. It is bound
//! to an invoice, or recorded unbound as an advance deposit against a
//! reservation or restaurant order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{GuestId, InvoiceId, Money, PaymentId, UserId};

use crate::error::BillingError;
use crate::folio::{FolioOwner, LedgerKind};

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    BankTransfer,
    Wallet,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::Other => "other",
        }
    }
}

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    /// Counted towards invoice and folio settlement
    Completed,
    Failed,
    /// Returned to the guest; no longer counted
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

/// Caller-supplied payment details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInput {
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    /// Generated when absent
    pub reference_number: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    /// Required for deposits; ignored when the payment is bound to an invoice
    pub owner: Option<FolioOwner>,
    pub guest_id: Option<GuestId>,
}

impl PaymentInput {
    pub fn new(amount: Decimal, payment_method: PaymentMethod) -> Self {
        Self {
            amount,
            payment_method,
            reference_number: None,
            payment_date: None,
            notes: None,
            owner: None,
            guest_id: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference_number = Some(reference.into());
        self
    }

    pub fn for_owner(mut self, owner: FolioOwner) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn by_guest(mut self, guest_id: GuestId) -> Self {
        self.guest_id = Some(guest_id);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Rejects non-positive amounts and blank references
    pub fn validate(&self) -> Result<(), BillingError> {
        if self.amount <= Decimal::ZERO {
            return Err(BillingError::InvalidAmount(format!(
                "payment amount must be positive, got {}",
                self.amount
            )));
        }
        if let Some(reference) = &self.reference_number {
            if reference.trim().is_empty() {
                return Err(BillingError::InvalidInput("reference number must not be blank".into()));
            }
        }
        Ok(())
    }
}

/// A recorded payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub kind: LedgerKind,
    pub invoice_id: Option<InvoiceId>,
    pub owner: FolioOwner,
    pub guest_id: Option<GuestId>,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub reference_number: String,
    pub payment_date: DateTime<Utc>,
    pub status: PaymentStatus,
    pub notes: Option<String>,
    pub processed_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Builds a completed payment from validated input
    pub fn completed(
        input: PaymentInput,
        owner: FolioOwner,
        invoice_id: Option<InvoiceId>,
        guest_id: Option<GuestId>,
        amount: Money,
        processed_by: UserId,
    ) -> Self {
        let now = Utc::now();
        let id = PaymentId::new_v7();
        let reference_number = input
            .reference_number
            .map(|r| r.trim().to_string())
            .unwrap_or_else(|| generate_reference_number(now, id));

        Self {
            id,
            kind: owner.kind(),
            invoice_id,
            owner,
            guest_id,
            amount,
            payment_method: input.payment_method,
            reference_number,
            payment_date: input.payment_date.unwrap_or(now),
            status: PaymentStatus::Completed,
            notes: input.notes,
            processed_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks a completed payment as refunded
    pub fn refund(&mut self, now: DateTime<Utc>) -> Result<(), BillingError> {
        if self.status != PaymentStatus::Completed {
            return Err(BillingError::InvalidState(format!(
                "payment {} is {}, only completed payments can be refunded",
                self.reference_number,
                self.status.as_str()
            )));
        }
        self.status = PaymentStatus::Refunded;
        self.updated_at = now;
        Ok(())
    }
}

/// `PAY-<unix millis>-<6 hex>`; the suffix comes from the payment id so two
/// payments in the same millisecond still differ
pub fn generate_reference_number(now: DateTime<Utc>, id: PaymentId) -> String {
    let simple = id.as_uuid().simple().to_string();
    let suffix = &simple[simple.len() - 6..];
    format!("PAY-{}-{}", now.timestamp_millis(), suffix.to_uppercase())
}
