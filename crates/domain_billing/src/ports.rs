//! Ledger Ports
//!
//! Port interfaces the ledger needs from the outside world:
//!
//! - [`LedgerStore`] opens [`LedgerTransaction`]s, the unit of work every
//!   mutating operation runs in. The top-level service operation owns commit
//!   and rollback; nothing below it commits on its own.
//! - [`Directory`] and [`MenuCatalog`] are read-only views of records owned by
//!   the reservation and restaurant systems.
//! - [`InvoiceNotifier`] renders and sends an invoice after commit.
//!
//! # Locking contract
//!
//! `lock_*` methods take a write lock held until the transaction ends. The
//! service always locks an invoice before its folio, and a restaurant folio
//! before a hotel folio.
//!
//! ```rust,ignore
//! let mut tx = store.begin().await?;
//! let mut folio = tx.lock_folio(LedgerKind::Hotel, folio_id).await?;
//! tx.insert_charge(LedgerKind::Hotel, &charge).await?;
//! tx.update_folio(&folio).await?;
//! tx.commit().await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{
    DomainPort, FolioId, GuestId, HealthCheckable, InvoiceId, MenuItemId, Money, PaymentId,
    PortError, ReservationId, RoomId, VariantId,
};

use crate::audit::AuditEntry;
use crate::charge::{ChargeSource, FolioCharge};
use crate::detail::InvoiceDetail;
use crate::folio::{Folio, FolioOwner, LedgerKind};
use crate::invoice::Invoice;
use crate::payment::{Payment, PaymentStatus};

/// A reservation, as far as billing is concerned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationSummary {
    pub id: ReservationId,
    pub guest_id: GuestId,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub room_ids: Vec<RoomId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestSummary {
    pub id: GuestId,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: RoomId,
    pub room_number: String,
    pub nightly_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemSummary {
    pub id: MenuItemId,
    pub name: String,
    pub price: Decimal,
    pub is_available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSummary {
    pub id: VariantId,
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub price_delta: Decimal,
}

/// Factory for ledger units of work
#[async_trait]
pub trait LedgerStore: DomainPort + HealthCheckable {
    /// Opens a transaction
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, PortError>;
}

/// One ledger unit of work
///
/// Dropping a transaction without committing rolls it back.
#[async_trait]
pub trait LedgerTransaction: Send {
    // --- folios ---

    async fn insert_folio(&mut self, folio: &Folio) -> Result<(), PortError>;

    async fn folio(&mut self, kind: LedgerKind, id: FolioId) -> Result<Option<Folio>, PortError>;

    async fn folio_by_owner(&mut self, owner: FolioOwner) -> Result<Option<Folio>, PortError>;

    /// Reads and write-locks a folio
    async fn lock_folio(&mut self, kind: LedgerKind, id: FolioId) -> Result<Option<Folio>, PortError>;

    /// Reads and write-locks the folio of an owner
    async fn lock_folio_by_owner(&mut self, owner: FolioOwner) -> Result<Option<Folio>, PortError>;

    /// Persists status and aggregates of a locked folio
    async fn update_folio(&mut self, folio: &Folio) -> Result<(), PortError>;

    // --- charges ---

    async fn insert_charge(&mut self, kind: LedgerKind, charge: &FolioCharge) -> Result<(), PortError>;

    /// All charges of a folio, oldest first
    async fn list_charges(&mut self, kind: LedgerKind, folio_id: FolioId) -> Result<Vec<FolioCharge>, PortError>;

    /// Charges of a folio carrying `source`, oldest first
    async fn list_charges_by_source(
        &mut self,
        kind: LedgerKind,
        folio_id: FolioId,
        source: ChargeSource,
    ) -> Result<Vec<FolioCharge>, PortError>;

    /// Folios of `kind` holding any charge tagged with `source`, by id
    async fn folios_with_source(&mut self, kind: LedgerKind, source: ChargeSource) -> Result<Vec<FolioId>, PortError>;

    // --- invoices ---

    /// Highest sequence number used for `kind` in `year`, plus one
    ///
    /// Implementations serialise concurrent allocations where they can; the
    /// unique constraint on the invoice number is the backstop.
    async fn next_invoice_sequence(&mut self, kind: LedgerKind, year: i32) -> Result<i64, PortError>;

    /// Inserts an invoice with its items; `Conflict` on a duplicate number
    /// or a second invoice for the same folio
    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), PortError>;

    async fn invoice(&mut self, kind: LedgerKind, id: InvoiceId) -> Result<Option<Invoice>, PortError>;

    async fn invoice_by_folio(&mut self, kind: LedgerKind, folio_id: FolioId) -> Result<Option<Invoice>, PortError>;

    /// Reads and write-locks an invoice
    async fn lock_invoice(&mut self, kind: LedgerKind, id: InvoiceId) -> Result<Option<Invoice>, PortError>;

    /// Persists `paid_amount`, `balance_amount` and `status`
    async fn update_invoice_settlement(&mut self, invoice: &Invoice) -> Result<(), PortError>;

    // --- payments ---

    /// Inserts a payment; `Conflict` when the reference number is already
    /// used on either ledger
    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), PortError>;

    async fn lock_payment(&mut self, kind: LedgerKind, id: PaymentId) -> Result<Option<Payment>, PortError>;

    async fn update_payment_status(
        &mut self,
        kind: LedgerKind,
        id: PaymentId,
        status: PaymentStatus,
    ) -> Result<(), PortError>;

    /// Binds an owner's completed, not yet invoiced payments to `invoice_id`
    ///
    /// Returns the payments bound, oldest first.
    async fn bind_unapplied_payments(
        &mut self,
        owner: FolioOwner,
        invoice_id: InvoiceId,
    ) -> Result<Vec<Payment>, PortError>;

    /// Sum of completed payments for an owner, bound or not
    async fn sum_completed_payments(&mut self, owner: FolioOwner) -> Result<Money, PortError>;

    async fn list_invoice_payments(&mut self, kind: LedgerKind, invoice_id: InvoiceId) -> Result<Vec<Payment>, PortError>;

    /// A page of a guest's payments, newest first, with the total count
    async fn list_guest_payments(
        &mut self,
        kind: LedgerKind,
        guest_id: GuestId,
        limit: u32,
        offset: u64,
    ) -> Result<(Vec<Payment>, u64), PortError>;

    // --- audit ---

    async fn record_audit(&mut self, entry: &AuditEntry) -> Result<(), PortError>;

    // --- completion ---

    async fn commit(self: Box<Self>) -> Result<(), PortError>;

    async fn rollback(self: Box<Self>) -> Result<(), PortError>;
}

/// Reservation system lookups
#[async_trait]
pub trait Directory: DomainPort + HealthCheckable {
    async fn reservation(&self, id: ReservationId) -> Result<ReservationSummary, PortError>;

    async fn guest(&self, id: GuestId) -> Result<GuestSummary, PortError>;

    async fn room(&self, id: RoomId) -> Result<RoomSummary, PortError>;
}

/// Restaurant menu lookups
#[async_trait]
pub trait MenuCatalog: DomainPort + HealthCheckable {
    async fn menu_item(&self, id: MenuItemId) -> Result<MenuItemSummary, PortError>;

    async fn variant(&self, id: VariantId) -> Result<VariantSummary, PortError>;
}

/// PDF rendering and e-mail delivery of invoices
#[async_trait]
pub trait InvoiceNotifier: DomainPort {
    async fn render_and_send(&self, detail: &InvoiceDetail) -> Result<(), PortError>;
}

/// In-memory adapters
///
/// `MemoryLedgerStore` serialises transactions: `begin` takes the store's
/// mutex for the life of the transaction and works on a copy of the state,
/// which `commit` writes back. That gives the same all-or-nothing and
/// no-lost-update behaviour the PostgreSQL adapter gets from row locks.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use chrono::Utc;
    use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

    use core_kernel::{AdapterHealth, Currency, HealthCheckResult};

    /// Everything the in-memory store holds
    #[derive(Debug, Clone, Default)]
    pub struct LedgerState {
        pub folios: HashMap<FolioId, Folio>,
        pub charges: Vec<(LedgerKind, FolioCharge)>,
        pub invoices: HashMap<InvoiceId, Invoice>,
        pub payments: HashMap<PaymentId, Payment>,
        pub audit: Vec<AuditEntry>,
    }

    /// In-memory `LedgerStore`
    #[derive(Debug, Clone)]
    pub struct MemoryLedgerStore {
        state: Arc<Mutex<LedgerState>>,
        currency: Currency,
        stale_sequence_reads: Arc<AtomicU32>,
    }

    impl Default for MemoryLedgerStore {
        fn default() -> Self {
            Self::new(Currency::INR)
        }
    }

    impl MemoryLedgerStore {
        pub fn new(currency: Currency) -> Self {
            Self {
                state: Arc::new(Mutex::new(LedgerState::default())),
                currency,
                stale_sequence_reads: Arc::new(AtomicU32::new(0)),
            }
        }

        /// Makes the next `count` sequence allocations return an already
        /// used number, as a racing allocator would
        pub fn with_stale_sequence_reads(self, count: u32) -> Self {
            self.stale_sequence_reads.store(count, Ordering::SeqCst);
            self
        }

        pub fn inject_stale_sequence_reads(&self, count: u32) {
            self.stale_sequence_reads.store(count, Ordering::SeqCst);
        }

        /// A copy of the committed state
        pub async fn snapshot(&self) -> LedgerState {
            self.state.lock().await.clone()
        }

        pub async fn audit_entries(&self) -> Vec<AuditEntry> {
            self.state.lock().await.audit.clone()
        }
    }

    impl DomainPort for MemoryLedgerStore {}

    #[async_trait]
    impl HealthCheckable for MemoryLedgerStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "memory-ledger-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("In-memory store".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl LedgerStore for MemoryLedgerStore {
        async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, PortError> {
            let guard = self.state.clone().lock_owned().await;
            let working = guard.clone();
            Ok(Box::new(MemoryTransaction {
                guard,
                working,
                currency: self.currency,
                stale_sequence_reads: self.stale_sequence_reads.clone(),
            }))
        }
    }

    /// Transaction over a private copy of the state
    pub struct MemoryTransaction {
        guard: OwnedMutexGuard<LedgerState>,
        working: LedgerState,
        currency: Currency,
        stale_sequence_reads: Arc<AtomicU32>,
    }

    impl MemoryTransaction {
        fn folio_of_kind(&self, kind: LedgerKind, id: FolioId) -> Option<Folio> {
            self.working.folios.get(&id).filter(|f| f.kind() == kind).cloned()
        }

        fn owner_folio(&self, owner: FolioOwner) -> Option<Folio> {
            self.working.folios.values().find(|f| f.owner == owner).cloned()
        }

        fn charges_where(&self, kind: LedgerKind, keep: impl Fn(&FolioCharge) -> bool) -> Vec<FolioCharge> {
            let mut charges: Vec<FolioCharge> = self
                .working
                .charges
                .iter()
                .filter(|(k, c)| *k == kind && keep(c))
                .map(|(_, c)| c.clone())
                .collect();
            charges.sort_by_key(|c| (c.created_at, *c.id.as_uuid()));
            charges
        }

        fn invoice_of_kind(&self, kind: LedgerKind, id: InvoiceId) -> Option<Invoice> {
            self.working.invoices.get(&id).filter(|i| i.kind == kind).cloned()
        }
    }

    #[async_trait]
    impl LedgerTransaction for MemoryTransaction {
        async fn insert_folio(&mut self, folio: &Folio) -> Result<(), PortError> {
            if self.owner_folio(folio.owner).is_some() {
                return Err(PortError::conflict(format!("a folio already exists for {}", folio.owner)));
            }
            self.working.folios.insert(folio.id, folio.clone());
            Ok(())
        }

        async fn folio(&mut self, kind: LedgerKind, id: FolioId) -> Result<Option<Folio>, PortError> {
            Ok(self.folio_of_kind(kind, id))
        }

        async fn folio_by_owner(&mut self, owner: FolioOwner) -> Result<Option<Folio>, PortError> {
            Ok(self.owner_folio(owner))
        }

        async fn lock_folio(&mut self, kind: LedgerKind, id: FolioId) -> Result<Option<Folio>, PortError> {
            Ok(self.folio_of_kind(kind, id))
        }

        async fn lock_folio_by_owner(&mut self, owner: FolioOwner) -> Result<Option<Folio>, PortError> {
            Ok(self.owner_folio(owner))
        }

        async fn update_folio(&mut self, folio: &Folio) -> Result<(), PortError> {
            match self.working.folios.get_mut(&folio.id) {
                Some(stored) => {
                    *stored = folio.clone();
                    Ok(())
                }
                None => Err(PortError::not_found("Folio", folio.id)),
            }
        }

        async fn insert_charge(&mut self, kind: LedgerKind, charge: &FolioCharge) -> Result<(), PortError> {
            if self.folio_of_kind(kind, charge.folio_id).is_none() {
                return Err(PortError::not_found("Folio", charge.folio_id));
            }
            self.working.charges.push((kind, charge.clone()));
            Ok(())
        }

        async fn list_charges(&mut self, kind: LedgerKind, folio_id: FolioId) -> Result<Vec<FolioCharge>, PortError> {
            Ok(self.charges_where(kind, |c| c.folio_id == folio_id))
        }

        async fn list_charges_by_source(
            &mut self,
            kind: LedgerKind,
            folio_id: FolioId,
            source: ChargeSource,
        ) -> Result<Vec<FolioCharge>, PortError> {
            Ok(self.charges_where(kind, |c| c.folio_id == folio_id && c.source == Some(source)))
        }

        async fn folios_with_source(&mut self, kind: LedgerKind, source: ChargeSource) -> Result<Vec<FolioId>, PortError> {
            let mut ids: Vec<FolioId> = self
                .charges_where(kind, |c| c.source == Some(source))
                .into_iter()
                .map(|c| c.folio_id)
                .collect();
            ids.sort_by_key(|id| *id.as_uuid());
            ids.dedup();
            Ok(ids)
        }

        async fn next_invoice_sequence(&mut self, kind: LedgerKind, year: i32) -> Result<i64, PortError> {
            let highest = self
                .working
                .invoices
                .values()
                .filter(|i| i.kind == kind && i.sequence.year == year)
                .map(|i| i.sequence.number)
                .max()
                .unwrap_or(0);

            let stale = self
                .stale_sequence_reads
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if stale && highest > 0 {
                return Ok(highest);
            }
            Ok(highest + 1)
        }

        async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), PortError> {
            let duplicate = self.working.invoices.values().any(|i| {
                i.kind == invoice.kind
                    && (i.invoice_number == invoice.invoice_number || i.folio_id == invoice.folio_id)
            });
            if duplicate {
                return Err(PortError::conflict(format!(
                    "invoice {} or an invoice for folio {} already exists",
                    invoice.invoice_number, invoice.folio_id
                )));
            }
            self.working.invoices.insert(invoice.id, invoice.clone());
            Ok(())
        }

        async fn invoice(&mut self, kind: LedgerKind, id: InvoiceId) -> Result<Option<Invoice>, PortError> {
            Ok(self.invoice_of_kind(kind, id))
        }

        async fn invoice_by_folio(&mut self, kind: LedgerKind, folio_id: FolioId) -> Result<Option<Invoice>, PortError> {
            Ok(self
                .working
                .invoices
                .values()
                .find(|i| i.kind == kind && i.folio_id == folio_id)
                .cloned())
        }

        async fn lock_invoice(&mut self, kind: LedgerKind, id: InvoiceId) -> Result<Option<Invoice>, PortError> {
            Ok(self.invoice_of_kind(kind, id))
        }

        async fn update_invoice_settlement(&mut self, invoice: &Invoice) -> Result<(), PortError> {
            let stored = self
                .working
                .invoices
                .get_mut(&invoice.id)
                .ok_or_else(|| PortError::not_found("Invoice", invoice.id))?;
            stored.paid_amount = invoice.paid_amount;
            stored.balance_amount = invoice.balance_amount;
            stored.status = invoice.status;
            stored.updated_at = invoice.updated_at;
            Ok(())
        }

        async fn insert_payment(&mut self, payment: &Payment) -> Result<(), PortError> {
            let duplicate = self
                .working
                .payments
                .values()
                .any(|p| p.reference_number == payment.reference_number);
            if duplicate {
                return Err(PortError::conflict(format!(
                    "payment reference {} already exists",
                    payment.reference_number
                )));
            }
            self.working.payments.insert(payment.id, payment.clone());
            Ok(())
        }

        async fn lock_payment(&mut self, kind: LedgerKind, id: PaymentId) -> Result<Option<Payment>, PortError> {
            Ok(self.working.payments.get(&id).filter(|p| p.kind == kind).cloned())
        }

        async fn update_payment_status(
            &mut self,
            kind: LedgerKind,
            id: PaymentId,
            status: PaymentStatus,
        ) -> Result<(), PortError> {
            let payment = self
                .working
                .payments
                .get_mut(&id)
                .filter(|p| p.kind == kind)
                .ok_or_else(|| PortError::not_found("Payment", id))?;
            payment.status = status;
            payment.updated_at = Utc::now();
            Ok(())
        }

        async fn bind_unapplied_payments(
            &mut self,
            owner: FolioOwner,
            invoice_id: InvoiceId,
        ) -> Result<Vec<Payment>, PortError> {
            let now = Utc::now();
            let mut bound: Vec<Payment> = self
                .working
                .payments
                .values_mut()
                .filter(|p| p.owner == owner && p.invoice_id.is_none() && p.status == PaymentStatus::Completed)
                .map(|p| {
                    p.invoice_id = Some(invoice_id);
                    p.updated_at = now;
                    p.clone()
                })
                .collect();
            bound.sort_by_key(|p| (p.payment_date, *p.id.as_uuid()));
            Ok(bound)
        }

        async fn sum_completed_payments(&mut self, owner: FolioOwner) -> Result<Money, PortError> {
            self.working
                .payments
                .values()
                .filter(|p| p.owner == owner && p.status == PaymentStatus::Completed)
                .try_fold(Money::zero(self.currency), |acc, p| acc.checked_add(&p.amount))
                .map_err(|e| PortError::internal(e.to_string()))
        }

        async fn list_invoice_payments(&mut self, kind: LedgerKind, invoice_id: InvoiceId) -> Result<Vec<Payment>, PortError> {
            let mut payments: Vec<Payment> = self
                .working
                .payments
                .values()
                .filter(|p| p.kind == kind && p.invoice_id == Some(invoice_id))
                .cloned()
                .collect();
            payments.sort_by_key(|p| p.payment_date);
            Ok(payments)
        }

        async fn list_guest_payments(
            &mut self,
            kind: LedgerKind,
            guest_id: GuestId,
            limit: u32,
            offset: u64,
        ) -> Result<(Vec<Payment>, u64), PortError> {
            let mut payments: Vec<Payment> = self
                .working
                .payments
                .values()
                .filter(|p| p.kind == kind && p.guest_id == Some(guest_id))
                .cloned()
                .collect();
            payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date).then(b.id.as_uuid().cmp(a.id.as_uuid())));
            let total = payments.len() as u64;
            let page = payments
                .into_iter()
                .skip(usize::try_from(offset).unwrap_or(usize::MAX))
                .take(limit as usize)
                .collect();
            Ok((page, total))
        }

        async fn record_audit(&mut self, entry: &AuditEntry) -> Result<(), PortError> {
            self.working.audit.push(entry.clone());
            Ok(())
        }

        async fn commit(self: Box<Self>) -> Result<(), PortError> {
            let MemoryTransaction { mut guard, working, .. } = *self;
            *guard = working;
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<(), PortError> {
            Ok(())
        }
    }

    /// In-memory `Directory`
    #[derive(Debug, Default, Clone)]
    pub struct MockDirectory {
        reservations: Arc<RwLock<HashMap<ReservationId, ReservationSummary>>>,
        guests: Arc<RwLock<HashMap<GuestId, GuestSummary>>>,
        rooms: Arc<RwLock<HashMap<RoomId, RoomSummary>>>,
    }

    impl MockDirectory {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn add_reservation(&self, reservation: ReservationSummary) {
            self.reservations.write().await.insert(reservation.id, reservation);
        }

        pub async fn add_guest(&self, guest: GuestSummary) {
            self.guests.write().await.insert(guest.id, guest);
        }

        pub async fn add_room(&self, room: RoomSummary) {
            self.rooms.write().await.insert(room.id, room);
        }
    }

    impl DomainPort for MockDirectory {}

    #[async_trait]
    impl HealthCheckable for MockDirectory {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-directory".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: None,
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl Directory for MockDirectory {
        async fn reservation(&self, id: ReservationId) -> Result<ReservationSummary, PortError> {
            self.reservations
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Reservation", id))
        }

        async fn guest(&self, id: GuestId) -> Result<GuestSummary, PortError> {
            self.guests
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Guest", id))
        }

        async fn room(&self, id: RoomId) -> Result<RoomSummary, PortError> {
            self.rooms
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Room", id))
        }
    }

    /// In-memory `MenuCatalog`
    #[derive(Debug, Default, Clone)]
    pub struct MockMenuCatalog {
        items: Arc<RwLock<HashMap<MenuItemId, MenuItemSummary>>>,
        variants: Arc<RwLock<HashMap<VariantId, VariantSummary>>>,
    }

    impl MockMenuCatalog {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn add_item(&self, item: MenuItemSummary) {
            self.items.write().await.insert(item.id, item);
        }

        pub async fn add_variant(&self, variant: VariantSummary) {
            self.variants.write().await.insert(variant.id, variant);
        }
    }

    impl DomainPort for MockMenuCatalog {}

    #[async_trait]
    impl HealthCheckable for MockMenuCatalog {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-menu-catalog".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: None,
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl MenuCatalog for MockMenuCatalog {
        async fn menu_item(&self, id: MenuItemId) -> Result<MenuItemSummary, PortError> {
            self.items
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("MenuItem", id))
        }

        async fn variant(&self, id: VariantId) -> Result<VariantSummary, PortError> {
            self.variants
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Variant", id))
        }
    }

    /// Notifier that records what it was asked to send
    #[derive(Debug, Default, Clone)]
    pub struct RecordingNotifier {
        sent: Arc<RwLock<Vec<InvoiceId>>>,
        fail_with: Option<String>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        /// A notifier whose every send fails
        pub fn failing(message: impl Into<String>) -> Self {
            Self {
                sent: Arc::default(),
                fail_with: Some(message.into()),
            }
        }

        pub async fn sent(&self) -> Vec<InvoiceId> {
            self.sent.read().await.clone()
        }
    }

    impl DomainPort for RecordingNotifier {}

    #[async_trait]
    impl InvoiceNotifier for RecordingNotifier {
        async fn render_and_send(&self, detail: &InvoiceDetail) -> Result<(), PortError> {
            if let Some(message) = &self.fail_with {
                return Err(PortError::ServiceUnavailable {
                    service: message.clone(),
                });
            }
            self.sent.write().await.push(detail.invoice.id);
            Ok(())
        }
    }
}
