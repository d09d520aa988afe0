//! Invoice generation and dispatch

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use core_kernel::{FolioId, Money, UserId};

use super::{finish, BillingService};
use crate::audit::{AuditAction, AuditEntry};
use crate::detail::InvoiceDetail;
use crate::error::BillingError;
use crate::folio::{FolioStatus, LedgerKind};
use crate::invoice::{Invoice, InvoiceSequence};
use crate::ports::LedgerTransaction;

/// Outcome of [`BillingService::generate_and_dispatch_invoice`]
///
/// The invoice is committed whether or not the notifier succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDispatch {
    pub detail: InvoiceDetail,
    pub notification_error: Option<String>,
}

impl InvoiceDispatch {
    pub fn delivered(&self) -> bool {
        self.notification_error.is_none()
    }
}

impl BillingService {
    /// Freezes a folio into an invoice and closes the folio
    ///
    /// Completed deposits the owner paid ahead are bound to the new invoice
    /// and count as already paid. Returns the folio's existing invoice
    /// unchanged when there already is one. Number collisions with a concurrent generation retry the whole
    /// transaction up to `invoice_number_attempts` times.
    ///
    /// # Errors
    ///
    /// * `FolioNotFound` - No such folio
    /// * `InvalidState` - Empty or transferred folio, or a folio that nets to a credit
    /// * `Conflict` - Every numbering attempt collided
    #[instrument(skip(self), fields(kind = kind.as_str(), folio_id = %folio_id))]
    pub async fn generate_invoice(
        &self,
        kind: LedgerKind,
        folio_id: FolioId,
        actor: UserId,
    ) -> Result<Invoice, BillingError> {
        let attempts = self.config.invoice_number_attempts.max(1);
        for attempt in 1..=attempts {
            let mut tx = self.begin().await?;
            let result = self.generate_invoice_tx(tx.as_mut(), kind, folio_id, actor).await;
            match finish(tx, result).await {
                Err(e) if e.is_retryable_conflict() => {
                    warn!(attempt, error = %e, "Invoice number collision, retrying");
                }
                other => return other,
            }
        }
        Err(BillingError::Conflict(format!(
            "could not allocate an invoice number for folio {} after {} attempts",
            folio_id, attempts
        )))
    }

    pub(super) async fn generate_invoice_tx(
        &self,
        tx: &mut dyn LedgerTransaction,
        kind: LedgerKind,
        folio_id: FolioId,
        actor: UserId,
    ) -> Result<Invoice, BillingError> {
        let mut folio = tx
            .lock_folio(kind, folio_id)
            .await?
            .ok_or_else(|| BillingError::FolioNotFound(folio_id.to_string()))?;

        if let Some(existing) = tx.invoice_by_folio(kind, folio_id).await? {
            info!(invoice_number = %existing.invoice_number, "Folio already invoiced");
            return Ok(existing);
        }
        if folio.status == FolioStatus::Transferred {
            return Err(BillingError::InvalidState(format!(
                "folio {} has been transferred",
                folio.id
            )));
        }

        self.reconcile_locked(tx, &mut folio).await?;
        let charges = tx.list_charges(kind, folio_id).await?;

        let now = Utc::now();
        let year = Invoice::numbering_year(now);
        let number = tx.next_invoice_sequence(kind, year).await?;
        let sequence = InvoiceSequence { year, number };
        let mut invoice = Invoice::snapshot(
            &folio,
            &charges,
            sequence,
            self.config.invoice_due_days,
            actor,
        )?;
        tx.insert_invoice(&invoice).await?;

        let deposits = tx.bind_unapplied_payments(folio.owner, invoice.id).await?;
        if !deposits.is_empty() {
            let held = Money::checked_sum(deposits.iter().map(|p| &p.amount), folio.currency)?;
            invoice.settle(held, now)?;
            tx.update_invoice_settlement(&invoice).await?;
            debug!(deposits = deposits.len(), paid = %invoice.paid_amount, "Deposits applied to invoice");
        }

        folio.close(now);
        tx.update_folio(&folio).await?;

        tx.record_audit(
            &AuditEntry::new(actor, AuditAction::InvoiceGenerated, "invoice", invoice.id)
                .with_details(json!({
                    "invoice_number": invoice.invoice_number,
                    "folio_id": folio.id,
                    "total_amount": invoice.total_amount.amount(),
                })),
        )
        .await?;

        info!(
            invoice_number = %invoice.invoice_number,
            total = %invoice.total_amount,
            items = invoice.items.len(),
            "Invoice generated"
        );
        Ok(invoice)
    }

    /// Generates the invoice, commits, then hands it to the notifier
    ///
    /// A notifier failure is reported in the outcome; the invoice stays.
    #[instrument(skip(self), fields(kind = kind.as_str(), folio_id = %folio_id))]
    pub async fn generate_and_dispatch_invoice(
        &self,
        kind: LedgerKind,
        folio_id: FolioId,
        actor: UserId,
    ) -> Result<InvoiceDispatch, BillingError> {
        let invoice = self.generate_invoice(kind, folio_id, actor).await?;
        let detail = self.get_invoice_details(kind, invoice.id).await?;

        let notification_error = match self.notifier.render_and_send(&detail).await {
            Ok(()) => None,
            Err(e) => {
                warn!(invoice_number = %detail.invoice.invoice_number, error = %e, "Invoice notification failed");
                Some(e.to_string())
            }
        };
        Ok(InvoiceDispatch {
            detail,
            notification_error,
        })
    }
}
