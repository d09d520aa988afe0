//! Lock-order recorder
//!
//! Wraps the in-memory store and watches each transaction's calls. A
//! transaction that writes must have locked every folio whose charges or
//! payments it read, must touch only folios it locked, and must lock
//! invoices before folios and restaurant folios before hotel folios.
//! Anything else is written to the shared log.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use core_kernel::{
    DomainPort, FolioId, GuestId, HealthCheckResult, HealthCheckable, InvoiceId, Money, PaymentId,
    PortError,
};
use domain_billing::ports::mock::MemoryLedgerStore;
use domain_billing::{
    AuditEntry, ChargeSource, Folio, FolioCharge, FolioOwner, Invoice, LedgerKind, LedgerStore,
    LedgerTransaction, Payment, PaymentStatus,
};

#[derive(Clone)]
pub struct LockAuditStore {
    inner: MemoryLedgerStore,
    violations: Arc<Mutex<Vec<String>>>,
}

impl LockAuditStore {
    pub fn new(inner: MemoryLedgerStore) -> Self {
        Self {
            inner,
            violations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn violations(&self) -> Vec<String> {
        self.violations.lock().unwrap().clone()
    }
}

impl DomainPort for LockAuditStore {}

#[async_trait]
impl HealthCheckable for LockAuditStore {
    async fn health_check(&self) -> HealthCheckResult {
        self.inner.health_check().await
    }
}

#[async_trait]
impl LedgerStore for LockAuditStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, PortError> {
        Ok(Box::new(LockAuditTransaction {
            inner: self.inner.begin().await?,
            folios: HashSet::new(),
            owners: Vec::new(),
            invoices: HashSet::new(),
            hotel_locked: false,
            unlocked_reads: Vec::new(),
            wrote: false,
            violations: self.violations.clone(),
        }))
    }
}

struct LockAuditTransaction {
    inner: Box<dyn LedgerTransaction>,
    folios: HashSet<FolioId>,
    owners: Vec<FolioOwner>,
    invoices: HashSet<InvoiceId>,
    hotel_locked: bool,
    unlocked_reads: Vec<String>,
    wrote: bool,
    violations: Arc<Mutex<Vec<String>>>,
}

impl LockAuditTransaction {
    fn flag(&self, message: String) {
        self.violations.lock().unwrap().push(message);
    }

    fn locked(&mut self, folio: &Option<Folio>) {
        if let Some(folio) = folio {
            if folio.kind() == LedgerKind::Restaurant && self.hotel_locked {
                self.flag(format!("restaurant folio {} locked after a hotel folio", folio.id));
            }
            if folio.kind() == LedgerKind::Hotel {
                self.hotel_locked = true;
            }
            self.folios.insert(folio.id);
            self.owners.push(folio.owner);
        }
    }

    fn write_to(&mut self, what: &str, folio_id: FolioId) {
        self.wrote = true;
        if !self.folios.contains(&folio_id) {
            self.flag(format!("{} on unlocked folio {}", what, folio_id));
        }
    }

    fn write_for(&mut self, what: &str, owner: FolioOwner) {
        self.wrote = true;
        if !self.owners.contains(&owner) {
            self.flag(format!("{} for {} without its folio lock", what, owner));
        }
    }
}

#[async_trait]
impl LedgerTransaction for LockAuditTransaction {
    async fn insert_folio(&mut self, folio: &Folio) -> Result<(), PortError> {
        self.inner.insert_folio(folio).await?;
        self.wrote = true;
        self.locked(&Some(folio.clone()));
        Ok(())
    }

    async fn folio(&mut self, kind: LedgerKind, id: FolioId) -> Result<Option<Folio>, PortError> {
        self.inner.folio(kind, id).await
    }

    async fn folio_by_owner(&mut self, owner: FolioOwner) -> Result<Option<Folio>, PortError> {
        self.inner.folio_by_owner(owner).await
    }

    async fn lock_folio(&mut self, kind: LedgerKind, id: FolioId) -> Result<Option<Folio>, PortError> {
        let folio = self.inner.lock_folio(kind, id).await?;
        self.locked(&folio);
        Ok(folio)
    }

    async fn lock_folio_by_owner(&mut self, owner: FolioOwner) -> Result<Option<Folio>, PortError> {
        let folio = self.inner.lock_folio_by_owner(owner).await?;
        self.locked(&folio);
        Ok(folio)
    }

    async fn update_folio(&mut self, folio: &Folio) -> Result<(), PortError> {
        self.write_to("update_folio", folio.id);
        self.inner.update_folio(folio).await
    }

    async fn insert_charge(&mut self, kind: LedgerKind, charge: &FolioCharge) -> Result<(), PortError> {
        self.write_to("insert_charge", charge.folio_id);
        self.inner.insert_charge(kind, charge).await
    }

    async fn list_charges(&mut self, kind: LedgerKind, folio_id: FolioId) -> Result<Vec<FolioCharge>, PortError> {
        if !self.folios.contains(&folio_id) {
            self.unlocked_reads.push(format!("list_charges on unlocked folio {}", folio_id));
        }
        self.inner.list_charges(kind, folio_id).await
    }

    async fn list_charges_by_source(
        &mut self,
        kind: LedgerKind,
        folio_id: FolioId,
        source: ChargeSource,
    ) -> Result<Vec<FolioCharge>, PortError> {
        if !self.folios.contains(&folio_id) {
            self.unlocked_reads
                .push(format!("list_charges_by_source on unlocked folio {}", folio_id));
        }
        self.inner.list_charges_by_source(kind, folio_id, source).await
    }

    async fn folios_with_source(&mut self, kind: LedgerKind, source: ChargeSource) -> Result<Vec<FolioId>, PortError> {
        self.inner.folios_with_source(kind, source).await
    }

    async fn next_invoice_sequence(&mut self, kind: LedgerKind, year: i32) -> Result<i64, PortError> {
        self.inner.next_invoice_sequence(kind, year).await
    }

    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), PortError> {
        self.write_to("insert_invoice", invoice.folio_id);
        self.invoices.insert(invoice.id);
        self.inner.insert_invoice(invoice).await
    }

    async fn invoice(&mut self, kind: LedgerKind, id: InvoiceId) -> Result<Option<Invoice>, PortError> {
        self.inner.invoice(kind, id).await
    }

    async fn invoice_by_folio(&mut self, kind: LedgerKind, folio_id: FolioId) -> Result<Option<Invoice>, PortError> {
        self.inner.invoice_by_folio(kind, folio_id).await
    }

    async fn lock_invoice(&mut self, kind: LedgerKind, id: InvoiceId) -> Result<Option<Invoice>, PortError> {
        if !self.folios.is_empty() {
            self.flag(format!("invoice {} locked after a folio", id));
        }
        self.invoices.insert(id);
        self.inner.lock_invoice(kind, id).await
    }

    async fn update_invoice_settlement(&mut self, invoice: &Invoice) -> Result<(), PortError> {
        self.wrote = true;
        if !self.invoices.contains(&invoice.id) {
            self.flag(format!("settlement of unlocked invoice {}", invoice.id));
        }
        self.inner.update_invoice_settlement(invoice).await
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), PortError> {
        self.write_for("insert_payment", payment.owner);
        self.inner.insert_payment(payment).await
    }

    async fn lock_payment(&mut self, kind: LedgerKind, id: PaymentId) -> Result<Option<Payment>, PortError> {
        self.inner.lock_payment(kind, id).await
    }

    async fn update_payment_status(
        &mut self,
        kind: LedgerKind,
        id: PaymentId,
        status: PaymentStatus,
    ) -> Result<(), PortError> {
        self.wrote = true;
        self.inner.update_payment_status(kind, id, status).await
    }

    async fn bind_unapplied_payments(
        &mut self,
        owner: FolioOwner,
        invoice_id: InvoiceId,
    ) -> Result<Vec<Payment>, PortError> {
        self.write_for("bind_unapplied_payments", owner);
        self.inner.bind_unapplied_payments(owner, invoice_id).await
    }

    async fn sum_completed_payments(&mut self, owner: FolioOwner) -> Result<Money, PortError> {
        if !self.owners.contains(&owner) {
            self.unlocked_reads
                .push(format!("sum_completed_payments for {} without its folio lock", owner));
        }
        self.inner.sum_completed_payments(owner).await
    }

    async fn list_invoice_payments(&mut self, kind: LedgerKind, invoice_id: InvoiceId) -> Result<Vec<Payment>, PortError> {
        self.inner.list_invoice_payments(kind, invoice_id).await
    }

    async fn list_guest_payments(
        &mut self,
        kind: LedgerKind,
        guest_id: GuestId,
        limit: u32,
        offset: u64,
    ) -> Result<(Vec<Payment>, u64), PortError> {
        self.inner.list_guest_payments(kind, guest_id, limit, offset).await
    }

    async fn record_audit(&mut self, entry: &AuditEntry) -> Result<(), PortError> {
        self.inner.record_audit(entry).await
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        let this = *self;
        if this.wrote {
            this.violations.lock().unwrap().extend(this.unlocked_reads);
        }
        this.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<(), PortError> {
        let this = *self;
        this.inner.rollback().await
    }
}
