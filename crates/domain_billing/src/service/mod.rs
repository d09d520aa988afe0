//! Ledger operations
//!
//! [`BillingService`] is the only entry point that writes to the ledger. Each
//! public operation opens one [`LedgerTransaction`], takes its locks, writes
//! charges/invoices/payments, reconciles the affected folios and records the
//! audit trail before committing. Any error before commit rolls everything
//! back.
//!
//! ```rust,ignore
//! let service = BillingService::new(store, directory, menu, notifier, BillingConfig::default());
//! let folio = service.create_folio(reservation_id, guest_id, actor).await?;
//! service.post_charge(LedgerKind::Hotel, folio.id, ChargeInput::new(ChargeType::Room, "Room 101", dec!(1000)), actor).await?;
//! let invoice = service.generate_invoice(LedgerKind::Hotel, folio.id, actor).await?;
//! ```

mod bridge;
mod charges;
mod invoicing;
mod payments;
mod queries;

pub use bridge::OrderPosting;
pub use invoicing::InvoiceDispatch;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, warn};

use core_kernel::{Currency, PortError, UserId};

use crate::audit::{AuditAction, AuditEntry};
use crate::charge::{ChargeInput, ChargeSource, FolioCharge};
use crate::config::BillingConfig;
use crate::error::BillingError;
use crate::folio::Folio;
use crate::ports::{Directory, InvoiceNotifier, LedgerStore, LedgerTransaction, MenuCatalog};
use crate::producers::plan_replacement;
use crate::reconcile::{reconcile, FolioTotals};

/// Orchestrates the ledger over its ports
pub struct BillingService {
    store: Arc<dyn LedgerStore>,
    directory: Arc<dyn Directory>,
    menu: Arc<dyn MenuCatalog>,
    notifier: Arc<dyn InvoiceNotifier>,
    config: BillingConfig,
}

impl BillingService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        directory: Arc<dyn Directory>,
        menu: Arc<dyn MenuCatalog>,
        notifier: Arc<dyn InvoiceNotifier>,
        config: BillingConfig,
    ) -> Self {
        Self {
            store,
            directory,
            menu,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    pub fn directory(&self) -> &Arc<dyn Directory> {
        &self.directory
    }

    pub fn menu(&self) -> &Arc<dyn MenuCatalog> {
        &self.menu
    }

    fn currency(&self) -> Currency {
        self.config.currency
    }

    fn standard_rate(&self, at: DateTime<Utc>) -> Result<Decimal, BillingError> {
        self.config.standard_rate(at.date_naive())
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, BillingError> {
        Ok(self.store.begin().await?)
    }

    /// Posts one charge on a folio that is locked in `tx`
    ///
    /// The rate table is only consulted for taxable charges without an
    /// explicit rate; untaxed charges carry a zero rate.
    async fn post_locked(
        &self,
        tx: &mut dyn LedgerTransaction,
        folio: &Folio,
        input: ChargeInput,
        actor: UserId,
    ) -> Result<FolioCharge, BillingError> {
        let rate = if input.tax_rate.is_some() || !input.is_taxable || input.charge_type.is_credit() {
            Decimal::ZERO
        } else {
            self.standard_rate(input.charge_date.unwrap_or_else(Utc::now))?
        };
        let charge = FolioCharge::post(folio, input, rate, actor)?;
        tx.insert_charge(folio.kind(), &charge).await?;
        tx.record_audit(
            &AuditEntry::new(actor, AuditAction::ChargePosted, "folio_charge", charge.id)
                .with_details(json!({
                    "folio_id": folio.id,
                    "charge_type": charge.charge_type,
                    "amount": charge.amount.amount(),
                    "tax_amount": charge.tax_amount.amount(),
                })),
        )
        .await?;
        debug!(folio_id = %folio.id, charge_id = %charge.id, amount = %charge.amount, "Charge posted");
        Ok(charge)
    }

    /// Posts the reversal of `original` on a folio locked in `tx`
    async fn reverse_locked(
        &self,
        tx: &mut dyn LedgerTransaction,
        folio: &Folio,
        original: &FolioCharge,
        actor: UserId,
        reason: Option<&str>,
    ) -> Result<FolioCharge, BillingError> {
        folio.ensure_active()?;
        let reversal = original.reversal(actor, reason)?;
        tx.insert_charge(folio.kind(), &reversal).await?;
        tx.record_audit(
            &AuditEntry::new(actor, AuditAction::ChargeReversed, "folio_charge", reversal.id)
                .with_details(json!({
                    "folio_id": folio.id,
                    "reverses_charge_id": original.id,
                    "amount": reversal.amount.amount(),
                })),
        )
        .await?;
        debug!(folio_id = %folio.id, charge_id = %original.id, "Charge reversed");
        Ok(reversal)
    }

    /// Recomputes and stores the totals of a folio locked in `tx`
    async fn reconcile_locked(
        &self,
        tx: &mut dyn LedgerTransaction,
        folio: &mut Folio,
    ) -> Result<FolioTotals, BillingError> {
        let charges = tx.list_charges(folio.kind(), folio.id).await?;
        let payments = tx.sum_completed_payments(folio.owner).await?;
        let totals = reconcile(&charges, payments, self.currency())?;
        folio.apply_totals(&totals);
        tx.update_folio(folio).await?;
        Ok(totals)
    }

    /// Brings the charges a producer owns on `folio` in line with `desired`
    ///
    /// Returns every charge written, reversals first.
    async fn replace_source_charges(
        &self,
        tx: &mut dyn LedgerTransaction,
        folio: &Folio,
        source: ChargeSource,
        desired: Vec<ChargeInput>,
        actor: UserId,
    ) -> Result<Vec<FolioCharge>, BillingError> {
        let existing = tx.list_charges_by_source(folio.kind(), folio.id, source).await?;
        let plan = plan_replacement(&existing, desired);
        if plan.is_empty() {
            debug!(folio_id = %folio.id, source_id = %source.source_id, "Source charges unchanged");
            return Ok(Vec::new());
        }
        folio.ensure_active()?;

        let mut written = Vec::with_capacity(plan.reverse.len() + plan.post.len());
        for original in &plan.reverse {
            written.push(self.reverse_locked(tx, folio, original, actor, Some("superseded")).await?);
        }
        for input in plan.post {
            written.push(self.post_locked(tx, folio, input, actor).await?);
        }
        Ok(written)
    }
}

/// Commits on success, rolls back on failure
async fn finish<T>(
    tx: Box<dyn LedgerTransaction>,
    result: Result<T, BillingError>,
) -> Result<T, BillingError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = tx.rollback().await {
                warn!(error = %rollback_error, "Rollback failed");
            }
            Err(error)
        }
    }
}

/// Turns a collaborator's `NotFound` into `None`
fn optional<T>(result: Result<T, PortError>) -> Result<Option<T>, BillingError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Turns a collaborator's `NotFound` into a `ReferenceNotFound`
fn required<T>(
    result: Result<T, PortError>,
    entity: &'static str,
    id: impl std::fmt::Display,
) -> Result<T, BillingError> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_not_found() => Err(BillingError::reference_not_found(entity, id)),
        Err(e) => Err(e.into()),
    }
}
