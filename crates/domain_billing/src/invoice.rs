//! Invoices
//!
//! An invoice is a point-in-time snapshot of a folio. Its subtotal, tax and
//! total are fixed at creation; afterwards only the settlement fields
//! (`paid_amount`, `balance_amount`, `status`) move, driven by payments.

use chrono::{DateTime, Datelike, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ChargeId, Currency, FolioId, GuestId, InvoiceId, InvoiceItemId, Money, UserId};

use crate::charge::{ChargeType, FolioCharge};
use crate::error::BillingError;
use crate::folio::{Folio, FolioOwner, LedgerKind};
use crate::tax;

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    PartiallyPaid,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::PartiallyPaid => "partially_paid",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }
}

/// A year-scoped invoice sequence position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSequence {
    pub year: i32,
    pub number: i64,
}

impl InvoiceSequence {
    /// `INV-2024-000042` for the hotel ledger, `RINV-...` for restaurants
    pub fn format(&self, kind: LedgerKind) -> String {
        format!("{}-{}-{:06}", kind.invoice_prefix(), self.year, self.number)
    }
}

/// An immutable billing snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub kind: LedgerKind,
    pub invoice_number: String,
    pub sequence: InvoiceSequence,
    pub folio_id: FolioId,
    pub owner: FolioOwner,
    pub guest_id: Option<GuestId>,
    pub currency: Currency,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub balance_amount: Money,
    pub status: InvoiceStatus,
    pub invoice_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub created_by: UserId,
    pub items: Vec<InvoiceItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A frozen copy of one folio charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub id: InvoiceItemId,
    pub invoice_id: InvoiceId,
    /// The charge this line was copied from; never followed for mutation
    pub charge_id: ChargeId,
    pub charge_type: ChargeType,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Money,
    pub amount: Money,
    pub tax_rate: Decimal,
    pub tax_amount: Money,
    pub total_price: Money,
}

impl Invoice {
    /// Snapshots `folio` and its charges into a new invoice
    ///
    /// # Arguments
    ///
    /// * `folio` - The folio being invoiced, already reconciled
    /// * `charges` - Every charge on the folio
    /// * `sequence` - Allocated number for this invoice
    /// * `due_days` - Days until the invoice falls due
    /// * `created_by` - Acting user
    ///
    /// # Errors
    ///
    /// `InvalidState` when the folio has no charges or nets to a credit.
    pub fn snapshot(
        folio: &Folio,
        charges: &[FolioCharge],
        sequence: InvoiceSequence,
        due_days: i64,
        created_by: UserId,
    ) -> Result<Self, BillingError> {
        if charges.is_empty() {
            return Err(BillingError::InvalidState(format!(
                "folio {} has no charges to invoice",
                folio.id
            )));
        }

        let currency = folio.currency;
        let now = Utc::now();
        let id = InvoiceId::new_v7();

        let amounts: Vec<Money> = charges.iter().map(|c| c.amount).collect();
        let subtotal = Money::checked_sum(&amounts, currency)?;
        let tax_amount = tax::aggregate_tax(charges, currency)?;
        let total_amount = subtotal.checked_add(&tax_amount)?;
        if total_amount.is_negative() {
            return Err(BillingError::InvalidState(format!(
                "folio {} nets to a credit of {}",
                folio.id, total_amount
            )));
        }

        let line_taxes = tax::allocate_line_taxes(charges, currency)?;
        let items = charges
            .iter()
            .map(|charge| {
                let line_tax = line_taxes
                    .get(&charge.id)
                    .copied()
                    .unwrap_or_else(|| Money::zero(currency));
                Ok(InvoiceItem {
                    id: InvoiceItemId::new_v7(),
                    invoice_id: id,
                    charge_id: charge.id,
                    charge_type: charge.charge_type,
                    description: charge.description.clone(),
                    quantity: charge.quantity,
                    unit_price: charge.unit_price,
                    amount: charge.amount,
                    tax_rate: if charge.is_taxable { charge.tax_rate } else { Decimal::ZERO },
                    tax_amount: line_tax,
                    total_price: charge.amount.checked_add(&line_tax)?,
                })
            })
            .collect::<Result<Vec<_>, BillingError>>()?;

        let mut invoice = Self {
            id,
            kind: folio.kind(),
            invoice_number: sequence.format(folio.kind()),
            sequence,
            folio_id: folio.id,
            owner: folio.owner,
            guest_id: folio.guest_id,
            currency,
            subtotal,
            tax_amount,
            total_amount,
            paid_amount: Money::zero(currency),
            balance_amount: total_amount,
            status: InvoiceStatus::Sent,
            invoice_date: now,
            due_date: now + Duration::days(due_days),
            created_by,
            items,
            created_at: now,
            updated_at: now,
        };
        invoice.status = invoice.settlement_status(now);
        Ok(invoice)
    }

    /// Current remaining amount
    pub fn remaining(&self) -> Money {
        self.balance_amount
    }

    /// Status implied by the settlement figures at `now`
    pub fn settlement_status(&self, now: DateTime<Utc>) -> InvoiceStatus {
        if self.status == InvoiceStatus::Cancelled {
            InvoiceStatus::Cancelled
        } else if !self.balance_amount.is_positive() {
            InvoiceStatus::Paid
        } else if now > self.due_date {
            InvoiceStatus::Overdue
        } else if self.paid_amount.is_positive() {
            InvoiceStatus::PartiallyPaid
        } else {
            InvoiceStatus::Sent
        }
    }

    /// Applies a completed payment to the settlement figures
    ///
    /// # Errors
    ///
    /// `InvalidState` on cancelled invoices, `PaymentExceedsBalance` when
    /// the paid amount would pass the invoice total. The invoice is left
    /// untouched on error.
    pub fn apply_payment(&mut self, amount: Money, now: DateTime<Utc>) -> Result<(), BillingError> {
        if self.status == InvoiceStatus::Cancelled {
            return Err(BillingError::InvalidState(format!(
                "invoice {} is cancelled",
                self.invoice_number
            )));
        }
        let new_paid = self.paid_amount.checked_add(&amount)?;
        if new_paid.amount() > self.total_amount.amount() {
            return Err(BillingError::PaymentExceedsBalance {
                invoice_number: self.invoice_number.clone(),
                attempted: amount.amount(),
                balance: self.balance_amount.amount(),
            });
        }

        self.paid_amount = new_paid;
        self.balance_amount = self.total_amount.checked_sub(&new_paid)?;
        self.status = self.settlement_status(now);
        self.updated_at = now;
        Ok(())
    }

    /// Resets the settlement figures to `held`, the completed payments the
    /// invoice currently holds
    ///
    /// Anything held beyond the total stays on the folio as a credit; the
    /// invoice never shows more paid than it bills.
    pub fn settle(&mut self, held: Money, now: DateTime<Utc>) -> Result<(), BillingError> {
        if held.is_negative() {
            return Err(BillingError::InvalidState(format!(
                "invoice {} cannot hold {}",
                self.invoice_number, held
            )));
        }
        let paid = if held.amount() > self.total_amount.amount() {
            self.total_amount
        } else {
            held
        };
        self.paid_amount = paid;
        self.balance_amount = self.total_amount.checked_sub(&paid)?;
        self.status = self.settlement_status(now);
        self.updated_at = now;
        Ok(())
    }

    /// Calendar year used for numbering an invoice created at `at`
    pub fn numbering_year(at: DateTime<Utc>) -> i32 {
        at.year()
    }
}
