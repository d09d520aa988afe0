//! Payment recording and refunds

use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument};

use core_kernel::{InvoiceId, Money, PaymentId, UserId};

use super::{finish, BillingService};
use crate::audit::{AuditAction, AuditEntry};
use crate::error::BillingError;
use crate::folio::{Folio, FolioOwner, LedgerKind};
use crate::payment::{Payment, PaymentInput, PaymentStatus};
use crate::ports::LedgerTransaction;

impl BillingService {
    /// Records a payment against an invoice, or an advance deposit when
    /// `invoice_id` is `None`
    ///
    /// Bound payments lock the invoice, then its folio; the amount may not
    /// take the paid figure past the invoice total. Deposits need
    /// `input.owner` and go straight to the owner's folio until it is
    /// invoiced; after that they are applied to the invoice like any bound
    /// payment.
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - Non-positive amount, checked before any write
    /// * `InvoiceNotFound` / `FolioNotFound` - Unknown target
    /// * `PaymentExceedsBalance` - Overpayment; nothing is written
    /// * `Storage(Conflict)` - Duplicate reference number
    #[instrument(skip(self, input), fields(kind = kind.as_str(), invoice_id = ?invoice_id, amount = %input.amount))]
    pub async fn record_payment(
        &self,
        kind: LedgerKind,
        invoice_id: Option<InvoiceId>,
        input: PaymentInput,
        actor: UserId,
    ) -> Result<Payment, BillingError> {
        input.validate()?;
        let amount = Money::new(input.amount, self.currency()).round_to_currency();
        if !amount.is_positive() {
            return Err(BillingError::InvalidAmount(format!(
                "payment amount {} rounds to zero",
                input.amount
            )));
        }

        let mut tx = self.begin().await?;
        let result = match invoice_id {
            Some(invoice_id) => {
                self.record_invoice_payment_tx(tx.as_mut(), kind, invoice_id, input, amount, actor)
                    .await
            }
            None => self.record_deposit_tx(tx.as_mut(), kind, input, amount, actor).await,
        };
        let payment = finish(tx, result).await?;
        info!(
            payment_id = %payment.id,
            reference = %payment.reference_number,
            "Payment recorded"
        );
        Ok(payment)
    }

    async fn record_invoice_payment_tx(
        &self,
        tx: &mut dyn LedgerTransaction,
        kind: LedgerKind,
        invoice_id: InvoiceId,
        input: PaymentInput,
        amount: Money,
        actor: UserId,
    ) -> Result<Payment, BillingError> {
        let mut invoice = tx
            .lock_invoice(kind, invoice_id)
            .await?
            .ok_or_else(|| BillingError::InvoiceNotFound(invoice_id.to_string()))?;
        let mut folio = tx
            .lock_folio(kind, invoice.folio_id)
            .await?
            .ok_or_else(|| BillingError::FolioNotFound(invoice.folio_id.to_string()))?;

        invoice.apply_payment(amount, Utc::now())?;

        let guest_id = input.guest_id.or(invoice.guest_id);
        let payment = Payment::completed(input, invoice.owner, Some(invoice.id), guest_id, amount, actor);
        tx.insert_payment(&payment).await?;
        tx.update_invoice_settlement(&invoice).await?;
        self.reconcile_locked(tx, &mut folio).await?;
        self.audit_payment(tx, &payment, AuditAction::PaymentRecorded, actor).await?;
        Ok(payment)
    }

    async fn record_deposit_tx(
        &self,
        tx: &mut dyn LedgerTransaction,
        kind: LedgerKind,
        input: PaymentInput,
        amount: Money,
        actor: UserId,
    ) -> Result<Payment, BillingError> {
        let owner = input.owner.ok_or_else(|| {
            BillingError::InvalidInput("a deposit needs a reservation or order to hold it".into())
        })?;
        ensure_kind(owner, kind)?;

        // Once invoiced, money for the owner settles the invoice under its cap
        if let Some(folio) = tx.folio_by_owner(owner).await? {
            if let Some(invoice) = tx.invoice_by_folio(kind, folio.id).await? {
                return self
                    .record_invoice_payment_tx(tx, kind, invoice.id, input, amount, actor)
                    .await;
            }
        }

        let mut folio = tx
            .lock_folio_by_owner(owner)
            .await?
            .ok_or_else(|| BillingError::FolioNotFound(owner.to_string()))?;
        if tx.invoice_by_folio(kind, folio.id).await?.is_some() {
            return Err(BillingError::Conflict(format!(
                "folio {} was invoiced while the deposit was being recorded",
                folio.id
            )));
        }

        let guest_id = input.guest_id.or(folio.guest_id);
        let payment = Payment::completed(input, owner, None, guest_id, amount, actor);
        tx.insert_payment(&payment).await?;
        self.reconcile_locked(tx, &mut folio).await?;
        self.audit_payment(tx, &payment, AuditAction::PaymentRecorded, actor).await?;
        Ok(payment)
    }

    /// Refunds a completed payment
    ///
    /// Recomputes the invoice's paid and balance figures from the payments
    /// it still holds (when the payment was bound) and reconciles the folio.
    #[instrument(skip(self), fields(kind = kind.as_str(), payment_id = %payment_id))]
    pub async fn refund_payment(
        &self,
        kind: LedgerKind,
        payment_id: PaymentId,
        actor: UserId,
    ) -> Result<Payment, BillingError> {
        let mut tx = self.begin().await?;
        let result = self.refund_payment_tx(tx.as_mut(), kind, payment_id, actor).await;
        let payment = finish(tx, result).await?;
        info!(reference = %payment.reference_number, "Payment refunded");
        Ok(payment)
    }

    async fn refund_payment_tx(
        &self,
        tx: &mut dyn LedgerTransaction,
        kind: LedgerKind,
        payment_id: PaymentId,
        actor: UserId,
    ) -> Result<Payment, BillingError> {
        let mut payment = tx
            .lock_payment(kind, payment_id)
            .await?
            .ok_or_else(|| BillingError::PaymentNotFound(payment_id.to_string()))?;
        let now = Utc::now();
        payment.refund(now)?;
        tx.update_payment_status(kind, payment.id, PaymentStatus::Refunded).await?;

        if let Some(invoice_id) = payment.invoice_id {
            let mut invoice = tx
                .lock_invoice(kind, invoice_id)
                .await?
                .ok_or_else(|| BillingError::InvoiceNotFound(invoice_id.to_string()))?;
            let held = tx.list_invoice_payments(kind, invoice_id).await?;
            let held = Money::checked_sum(
                held.iter()
                    .filter(|p| p.status == PaymentStatus::Completed)
                    .map(|p| &p.amount),
                invoice.currency,
            )?;
            invoice.settle(held, now)?;
            tx.update_invoice_settlement(&invoice).await?;
        }
        let mut folio = self.owner_folio(tx, payment.owner).await?;

        self.reconcile_locked(tx, &mut folio).await?;
        self.audit_payment(tx, &payment, AuditAction::PaymentRefunded, actor).await?;
        Ok(payment)
    }

    async fn owner_folio(
        &self,
        tx: &mut dyn LedgerTransaction,
        owner: FolioOwner,
    ) -> Result<Folio, BillingError> {
        tx.lock_folio_by_owner(owner)
            .await?
            .ok_or_else(|| BillingError::FolioNotFound(owner.to_string()))
    }

    async fn audit_payment(
        &self,
        tx: &mut dyn LedgerTransaction,
        payment: &Payment,
        action: AuditAction,
        actor: UserId,
    ) -> Result<(), BillingError> {
        tx.record_audit(
            &AuditEntry::new(actor, action, "payment", payment.id).with_details(json!({
                "reference_number": payment.reference_number,
                "invoice_id": payment.invoice_id,
                "owner": payment.owner,
                "amount": payment.amount.amount(),
                "method": payment.payment_method,
            })),
        )
        .await?;
        Ok(())
    }
}

fn ensure_kind(owner: FolioOwner, kind: LedgerKind) -> Result<(), BillingError> {
    if owner.kind() != kind {
        return Err(BillingError::InvalidInput(format!(
            "{} does not belong to the {} ledger",
            owner,
            kind.as_str()
        )));
    }
    Ok(())
}
