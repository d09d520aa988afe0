//! PostgreSQL Ledger Adapter
//!
//! Implements the billing domain's `LedgerStore` on PostgreSQL. Each
//! [`PgLedgerTransaction`] wraps one database transaction:
//!
//! - `lock_*` methods read with `SELECT ... FOR UPDATE`
//! - invoice sequence allocation takes a transaction-scoped advisory lock
//!   per ledger and year, with the unique invoice number as the backstop
//! - payment references are checked against both ledgers under an advisory
//!   lock on the reference
//! - dropping the transaction without committing rolls it back
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresLedgerStore;
//! use domain_billing::{BillingService, LedgerStore};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn LedgerStore> = Arc::new(PostgresLedgerStore::new(pool, Currency::INR));
//! let mut tx = store.begin().await?;
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, ChargeId, Currency, DomainPort, FolioId, GuestId, HealthCheckResult,
    HealthCheckable, InvoiceId, InvoiceItemId, Money, PaymentId, PortError, UserId,
};
use domain_billing::{
    AuditEntry, ChargeSource, ChargeType, Folio, FolioCharge, FolioOwner, FolioStatus, Invoice,
    InvoiceItem, InvoiceSequence, InvoiceStatus, LedgerKind, LedgerStore, LedgerTransaction, Payment,
    PaymentMethod, PaymentStatus, SourceType,
};

use crate::error::DatabaseError;
use crate::repositories::ledger::{
    insert_audit, lock_payment_reference, AuditRow, ChargeRow, FolioRow, InvoiceItemRow, InvoiceRow, LedgerRepository,
    LedgerTables, PaymentRow,
};

/// Namespace of the invoice sequence advisory locks
const SEQUENCE_LOCK_NAMESPACE: i64 = 0x464F_4C49 << 32;

/// PostgreSQL-backed `LedgerStore`
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
    currency: Currency,
}

impl PostgresLedgerStore {
    /// Creates a store whose charge amounts are read in `currency`
    pub fn new(pool: PgPool, currency: Currency) -> Self {
        Self { pool, currency }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl DomainPort for PostgresLedgerStore {}

#[async_trait]
impl HealthCheckable for PostgresLedgerStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: "postgres-ledger-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: "postgres-ledger-store".to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, PortError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::from(&e))?;
        Ok(Box::new(PgLedgerTransaction {
            tx,
            currency: self.currency,
        }))
    }
}

/// One ledger unit of work on a PostgreSQL transaction
pub struct PgLedgerTransaction {
    tx: Transaction<'static, Postgres>,
    currency: Currency,
}

impl PgLedgerTransaction {
    fn conn(&mut self) -> &mut PgConnection {
        &mut *self.tx
    }

    async fn fetch_folio(&mut self, kind: LedgerKind, id: FolioId, lock: bool) -> Result<Option<Folio>, PortError> {
        let row = repository(kind).find_folio(self.conn(), *id.as_uuid(), lock).await?;
        Ok(row.map(|r| folio_from_row(kind, r)).transpose()?)
    }

    async fn fetch_owner_folio(&mut self, owner: FolioOwner, lock: bool) -> Result<Option<Folio>, PortError> {
        let kind = owner.kind();
        let row = repository(kind)
            .find_folio_by_owner(self.conn(), owner.as_uuid(), lock)
            .await?;
        Ok(row.map(|r| folio_from_row(kind, r)).transpose()?)
    }

    async fn fetch_invoice(&mut self, kind: LedgerKind, row: Option<InvoiceRow>) -> Result<Option<Invoice>, PortError> {
        match row {
            Some(row) => {
                let items = repository(kind).list_invoice_items(self.conn(), row.id).await?;
                Ok(Some(invoice_from_rows(kind, row, items)?))
            }
            None => Ok(None),
        }
    }

    fn charges(&self, rows: Vec<ChargeRow>) -> Result<Vec<FolioCharge>, PortError> {
        rows.into_iter()
            .map(|r| charge_from_row(self.currency, r))
            .collect::<Result<_, DatabaseError>>()
            .map_err(PortError::from)
    }

    fn payments(&self, kind: LedgerKind, rows: Vec<PaymentRow>) -> Result<Vec<Payment>, PortError> {
        rows.into_iter()
            .map(|r| payment_from_row(kind, self.currency, r))
            .collect::<Result<_, DatabaseError>>()
            .map_err(PortError::from)
    }
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    #[instrument(skip(self, folio), fields(folio_id = %folio.id, owner = %folio.owner))]
    async fn insert_folio(&mut self, folio: &Folio) -> Result<(), PortError> {
        repository(folio.kind()).insert_folio(self.conn(), &folio_to_row(folio)).await?;
        debug!("Folio inserted");
        Ok(())
    }

    async fn folio(&mut self, kind: LedgerKind, id: FolioId) -> Result<Option<Folio>, PortError> {
        self.fetch_folio(kind, id, false).await
    }

    async fn folio_by_owner(&mut self, owner: FolioOwner) -> Result<Option<Folio>, PortError> {
        self.fetch_owner_folio(owner, false).await
    }

    async fn lock_folio(&mut self, kind: LedgerKind, id: FolioId) -> Result<Option<Folio>, PortError> {
        self.fetch_folio(kind, id, true).await
    }

    async fn lock_folio_by_owner(&mut self, owner: FolioOwner) -> Result<Option<Folio>, PortError> {
        self.fetch_owner_folio(owner, true).await
    }

    async fn update_folio(&mut self, folio: &Folio) -> Result<(), PortError> {
        repository(folio.kind()).update_folio(self.conn(), &folio_to_row(folio)).await?;
        Ok(())
    }

    async fn insert_charge(&mut self, kind: LedgerKind, charge: &FolioCharge) -> Result<(), PortError> {
        repository(kind).insert_charge(self.conn(), &charge_to_row(charge)).await?;
        Ok(())
    }

    async fn list_charges(&mut self, kind: LedgerKind, folio_id: FolioId) -> Result<Vec<FolioCharge>, PortError> {
        let rows = repository(kind).list_charges(self.conn(), *folio_id.as_uuid()).await?;
        self.charges(rows)
    }

    async fn list_charges_by_source(
        &mut self,
        kind: LedgerKind,
        folio_id: FolioId,
        source: ChargeSource,
    ) -> Result<Vec<FolioCharge>, PortError> {
        let rows = repository(kind)
            .list_charges_by_source(
                self.conn(),
                *folio_id.as_uuid(),
                source.source_type.as_str(),
                source.source_id,
            )
            .await?;
        self.charges(rows)
    }

    async fn folios_with_source(&mut self, kind: LedgerKind, source: ChargeSource) -> Result<Vec<FolioId>, PortError> {
        let ids = repository(kind)
            .folios_with_source(self.conn(), source.source_type.as_str(), source.source_id)
            .await?;
        Ok(ids.into_iter().map(FolioId::from_uuid).collect())
    }

    #[instrument(skip(self), fields(kind = kind.as_str()))]
    async fn next_invoice_sequence(&mut self, kind: LedgerKind, year: i32) -> Result<i64, PortError> {
        let repo = repository(kind);
        repo.lock_invoice_sequence(self.conn(), sequence_lock_key(kind, year)).await?;
        let highest = repo.max_invoice_sequence(self.conn(), year).await?;
        debug!(highest, "Invoice sequence allocated");
        Ok(highest + 1)
    }

    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), PortError> {
        let (row, items) = invoice_to_rows(invoice);
        repository(invoice.kind).insert_invoice(self.conn(), &row, &items).await?;
        Ok(())
    }

    async fn invoice(&mut self, kind: LedgerKind, id: InvoiceId) -> Result<Option<Invoice>, PortError> {
        let row = repository(kind).find_invoice(self.conn(), *id.as_uuid(), false).await?;
        self.fetch_invoice(kind, row).await
    }

    async fn invoice_by_folio(&mut self, kind: LedgerKind, folio_id: FolioId) -> Result<Option<Invoice>, PortError> {
        let row = repository(kind)
            .find_invoice_by_folio(self.conn(), *folio_id.as_uuid())
            .await?;
        self.fetch_invoice(kind, row).await
    }

    async fn lock_invoice(&mut self, kind: LedgerKind, id: InvoiceId) -> Result<Option<Invoice>, PortError> {
        let row = repository(kind).find_invoice(self.conn(), *id.as_uuid(), true).await?;
        self.fetch_invoice(kind, row).await
    }

    async fn update_invoice_settlement(&mut self, invoice: &Invoice) -> Result<(), PortError> {
        repository(invoice.kind)
            .update_invoice_settlement(
                self.conn(),
                *invoice.id.as_uuid(),
                invoice.paid_amount.amount(),
                invoice.balance_amount.amount(),
                invoice.status.as_str(),
                invoice.updated_at,
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, payment), fields(reference = %payment.reference_number))]
    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), PortError> {
        let reference = payment.reference_number.as_str();
        lock_payment_reference(self.conn(), reference).await?;
        for kind in [LedgerKind::Hotel, LedgerKind::Restaurant] {
            if repository(kind).reference_exists(self.conn(), reference).await? {
                return Err(PortError::conflict(format!("payment reference {} already exists", reference)));
            }
        }
        repository(payment.kind).insert_payment(self.conn(), &payment_to_row(payment)).await?;
        Ok(())
    }

    async fn lock_payment(&mut self, kind: LedgerKind, id: PaymentId) -> Result<Option<Payment>, PortError> {
        let row = repository(kind).find_payment(self.conn(), *id.as_uuid(), true).await?;
        Ok(row
            .map(|r| payment_from_row(kind, self.currency, r))
            .transpose()?)
    }

    async fn update_payment_status(
        &mut self,
        kind: LedgerKind,
        id: PaymentId,
        status: PaymentStatus,
    ) -> Result<(), PortError> {
        repository(kind)
            .update_payment_status(self.conn(), *id.as_uuid(), status.as_str())
            .await?;
        Ok(())
    }

    async fn bind_unapplied_payments(
        &mut self,
        owner: FolioOwner,
        invoice_id: InvoiceId,
    ) -> Result<Vec<Payment>, PortError> {
        let kind = owner.kind();
        let rows = repository(kind)
            .bind_unapplied_payments(self.conn(), owner.as_uuid(), *invoice_id.as_uuid())
            .await?;
        debug!(bound = rows.len(), "Deposits bound to invoice");
        self.payments(kind, rows)
    }

    async fn sum_completed_payments(&mut self, owner: FolioOwner) -> Result<Money, PortError> {
        let total = repository(owner.kind())
            .sum_completed_payments(self.conn(), owner.as_uuid())
            .await?;
        Ok(Money::new(total, self.currency))
    }

    async fn list_invoice_payments(&mut self, kind: LedgerKind, invoice_id: InvoiceId) -> Result<Vec<Payment>, PortError> {
        let rows = repository(kind)
            .list_invoice_payments(self.conn(), *invoice_id.as_uuid())
            .await?;
        self.payments(kind, rows)
    }

    async fn list_guest_payments(
        &mut self,
        kind: LedgerKind,
        guest_id: GuestId,
        limit: u32,
        offset: u64,
    ) -> Result<(Vec<Payment>, u64), PortError> {
        let offset = i64::try_from(offset).map_err(|_| PortError::validation_field("offset out of range", "page"))?;
        let (rows, total) = repository(kind)
            .list_guest_payments(self.conn(), *guest_id.as_uuid(), i64::from(limit), offset)
            .await?;
        let payments = self.payments(kind, rows)?;
        Ok((payments, u64::try_from(total).unwrap_or_default()))
    }

    async fn record_audit(&mut self, entry: &AuditEntry) -> Result<(), PortError> {
        let row = AuditRow {
            id: *entry.id.as_uuid(),
            occurred_at: entry.occurred_at,
            actor: *entry.actor.as_uuid(),
            action: entry.action.as_str().to_string(),
            entity_type: entry.entity_type.clone(),
            entity_id: entry.entity_id,
            details: Some(entry.details.clone()),
        };
        insert_audit(self.conn(), &row).await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        self.tx
            .commit()
            .await
            .map_err(|e| match DatabaseError::from(&e) {
                DatabaseError::ConcurrentUpdate(m) => DatabaseError::ConcurrentUpdate(m),
                _ => DatabaseError::TransactionFailed(e.to_string()),
            })?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), PortError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;
        Ok(())
    }
}

fn repository(kind: LedgerKind) -> LedgerRepository {
    LedgerRepository::new(match kind {
        LedgerKind::Hotel => LedgerTables::HOTEL,
        LedgerKind::Restaurant => LedgerTables::RESTAURANT,
    })
}

/// Advisory lock key for one ledger's sequence in one year
fn sequence_lock_key(kind: LedgerKind, year: i32) -> i64 {
    let ledger: i64 = match kind {
        LedgerKind::Hotel => 1,
        LedgerKind::Restaurant => 2,
    };
    SEQUENCE_LOCK_NAMESPACE | (ledger << 24) | i64::from(year & 0x00FF_FFFF)
}

// --- codecs ---

const FOLIO_STATUSES: [FolioStatus; 3] = [FolioStatus::Active, FolioStatus::Closed, FolioStatus::Transferred];

const CHARGE_TYPES: [ChargeType; 10] = [
    ChargeType::Room,
    ChargeType::Service,
    ChargeType::Amenity,
    ChargeType::Restaurant,
    ChargeType::Minibar,
    ChargeType::Laundry,
    ChargeType::Adjustment,
    ChargeType::Discount,
    ChargeType::Refund,
    ChargeType::Reversal,
];

const SOURCE_TYPES: [SourceType; 4] = [
    SourceType::RoomStay,
    SourceType::RestaurantOrder,
    SourceType::Service,
    SourceType::Manual,
];

const INVOICE_STATUSES: [InvoiceStatus; 6] = [
    InvoiceStatus::Draft,
    InvoiceStatus::Sent,
    InvoiceStatus::PartiallyPaid,
    InvoiceStatus::Paid,
    InvoiceStatus::Overdue,
    InvoiceStatus::Cancelled,
];

const PAYMENT_METHODS: [PaymentMethod; 6] = [
    PaymentMethod::Cash,
    PaymentMethod::Card,
    PaymentMethod::Upi,
    PaymentMethod::BankTransfer,
    PaymentMethod::Wallet,
    PaymentMethod::Other,
];

const PAYMENT_STATUSES: [PaymentStatus; 4] = [
    PaymentStatus::Pending,
    PaymentStatus::Completed,
    PaymentStatus::Failed,
    PaymentStatus::Refunded,
];

fn decode<T: Copy>(all: &[T], name: fn(&T) -> &'static str, column: &str, value: &str) -> Result<T, DatabaseError> {
    all.iter()
        .find(|v| name(v) == value)
        .copied()
        .ok_or_else(|| DatabaseError::unknown_value(column, value))
}

fn decode_currency(value: &str) -> Result<Currency, DatabaseError> {
    value
        .trim()
        .parse()
        .map_err(|_| DatabaseError::unknown_value("currency", value))
}

fn folio_to_row(folio: &Folio) -> FolioRow {
    FolioRow {
        id: *folio.id.as_uuid(),
        owner_id: folio.owner.as_uuid(),
        guest_id: folio.guest_id.map(|g| *g.as_uuid()),
        status: folio.status.as_str().to_string(),
        currency: folio.currency.code().to_string(),
        total_charges: folio.total_charges.amount(),
        total_tax: folio.total_tax.amount(),
        total_payments: folio.total_payments.amount(),
        balance: folio.balance.amount(),
        opened_date: folio.opened_date,
        closed_date: folio.closed_date,
        created_at: folio.created_at,
        updated_at: folio.updated_at,
    }
}

fn folio_from_row(kind: LedgerKind, row: FolioRow) -> Result<Folio, DatabaseError> {
    let currency = decode_currency(&row.currency)?;
    Ok(Folio {
        id: FolioId::from_uuid(row.id),
        owner: FolioOwner::from_parts(kind, row.owner_id),
        guest_id: row.guest_id.map(GuestId::from_uuid),
        status: decode(&FOLIO_STATUSES, FolioStatus::as_str, "folio status", &row.status)?,
        currency,
        total_charges: Money::new(row.total_charges, currency),
        total_tax: Money::new(row.total_tax, currency),
        total_payments: Money::new(row.total_payments, currency),
        balance: Money::new(row.balance, currency),
        opened_date: row.opened_date,
        closed_date: row.closed_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn charge_to_row(charge: &FolioCharge) -> ChargeRow {
    ChargeRow {
        id: *charge.id.as_uuid(),
        folio_id: *charge.folio_id.as_uuid(),
        charge_type: charge.charge_type.as_str().to_string(),
        description: charge.description.clone(),
        unit_price: charge.unit_price.amount(),
        quantity: charge.quantity,
        discount: charge.discount.amount(),
        amount: charge.amount.amount(),
        tax_rate: charge.tax_rate,
        tax_amount: charge.tax_amount.amount(),
        total_amount: charge.total_amount.amount(),
        is_taxable: charge.is_taxable,
        charge_date: charge.charge_date,
        posted_by: *charge.posted_by.as_uuid(),
        source_type: charge.source.map(|s| s.source_type.as_str().to_string()),
        source_id: charge.source.map(|s| s.source_id),
        reverses_charge_id: charge.reverses_charge_id.map(|c| *c.as_uuid()),
        details: charge.details.clone(),
        created_at: charge.created_at,
    }
}

fn charge_from_row(currency: Currency, row: ChargeRow) -> Result<FolioCharge, DatabaseError> {
    let source = match (row.source_type.as_deref(), row.source_id) {
        (Some(source_type), Some(source_id)) => Some(ChargeSource::new(
            decode(&SOURCE_TYPES, SourceType::as_str, "source type", source_type)?,
            source_id,
        )),
        _ => None,
    };
    Ok(FolioCharge {
        id: ChargeId::from_uuid(row.id),
        folio_id: FolioId::from_uuid(row.folio_id),
        charge_type: decode(&CHARGE_TYPES, ChargeType::as_str, "charge type", &row.charge_type)?,
        description: row.description,
        unit_price: Money::new(row.unit_price, currency),
        quantity: row.quantity,
        discount: Money::new(row.discount, currency),
        amount: Money::new(row.amount, currency),
        tax_rate: row.tax_rate,
        tax_amount: Money::new(row.tax_amount, currency),
        total_amount: Money::new(row.total_amount, currency),
        is_taxable: row.is_taxable,
        charge_date: row.charge_date,
        posted_by: UserId::from_uuid(row.posted_by),
        source,
        reverses_charge_id: row.reverses_charge_id.map(ChargeId::from_uuid),
        details: row.details,
        created_at: row.created_at,
    })
}

fn invoice_to_rows(invoice: &Invoice) -> (InvoiceRow, Vec<InvoiceItemRow>) {
    let row = InvoiceRow {
        id: *invoice.id.as_uuid(),
        invoice_number: invoice.invoice_number.clone(),
        sequence_year: invoice.sequence.year,
        sequence_number: invoice.sequence.number,
        folio_id: *invoice.folio_id.as_uuid(),
        owner_id: invoice.owner.as_uuid(),
        guest_id: invoice.guest_id.map(|g| *g.as_uuid()),
        currency: invoice.currency.code().to_string(),
        subtotal: invoice.subtotal.amount(),
        tax_amount: invoice.tax_amount.amount(),
        total_amount: invoice.total_amount.amount(),
        paid_amount: invoice.paid_amount.amount(),
        balance_amount: invoice.balance_amount.amount(),
        status: invoice.status.as_str().to_string(),
        invoice_date: invoice.invoice_date,
        due_date: invoice.due_date,
        created_by: *invoice.created_by.as_uuid(),
        created_at: invoice.created_at,
        updated_at: invoice.updated_at,
    };
    let items = invoice
        .items
        .iter()
        .enumerate()
        .map(|(position, item)| InvoiceItemRow {
            id: *item.id.as_uuid(),
            invoice_id: *invoice.id.as_uuid(),
            charge_id: *item.charge_id.as_uuid(),
            charge_type: item.charge_type.as_str().to_string(),
            description: item.description.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price.amount(),
            amount: item.amount.amount(),
            tax_rate: item.tax_rate,
            tax_amount: item.tax_amount.amount(),
            total_price: item.total_price.amount(),
            position: i32::try_from(position).unwrap_or(i32::MAX),
        })
        .collect();
    (row, items)
}

fn invoice_from_rows(kind: LedgerKind, row: InvoiceRow, items: Vec<InvoiceItemRow>) -> Result<Invoice, DatabaseError> {
    let currency = decode_currency(&row.currency)?;
    let items = items
        .into_iter()
        .map(|item| {
            Ok(InvoiceItem {
                id: InvoiceItemId::from_uuid(item.id),
                invoice_id: InvoiceId::from_uuid(item.invoice_id),
                charge_id: ChargeId::from_uuid(item.charge_id),
                charge_type: decode(&CHARGE_TYPES, ChargeType::as_str, "charge type", &item.charge_type)?,
                description: item.description,
                quantity: item.quantity,
                unit_price: Money::new(item.unit_price, currency),
                amount: Money::new(item.amount, currency),
                tax_rate: item.tax_rate,
                tax_amount: Money::new(item.tax_amount, currency),
                total_price: Money::new(item.total_price, currency),
            })
        })
        .collect::<Result<Vec<_>, DatabaseError>>()?;

    Ok(Invoice {
        id: InvoiceId::from_uuid(row.id),
        kind,
        invoice_number: row.invoice_number,
        sequence: InvoiceSequence {
            year: row.sequence_year,
            number: row.sequence_number,
        },
        folio_id: FolioId::from_uuid(row.folio_id),
        owner: FolioOwner::from_parts(kind, row.owner_id),
        guest_id: row.guest_id.map(GuestId::from_uuid),
        currency,
        subtotal: Money::new(row.subtotal, currency),
        tax_amount: Money::new(row.tax_amount, currency),
        total_amount: Money::new(row.total_amount, currency),
        paid_amount: Money::new(row.paid_amount, currency),
        balance_amount: Money::new(row.balance_amount, currency),
        status: decode(&INVOICE_STATUSES, InvoiceStatus::as_str, "invoice status", &row.status)?,
        invoice_date: row.invoice_date,
        due_date: row.due_date,
        created_by: UserId::from_uuid(row.created_by),
        items,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn payment_to_row(payment: &Payment) -> PaymentRow {
    PaymentRow {
        id: *payment.id.as_uuid(),
        invoice_id: payment.invoice_id.map(|i| *i.as_uuid()),
        owner_id: payment.owner.as_uuid(),
        guest_id: payment.guest_id.map(|g| *g.as_uuid()),
        amount: payment.amount.amount(),
        payment_method: payment.payment_method.as_str().to_string(),
        reference_number: payment.reference_number.clone(),
        payment_date: payment.payment_date,
        status: payment.status.as_str().to_string(),
        notes: payment.notes.clone(),
        processed_by: *payment.processed_by.as_uuid(),
        created_at: payment.created_at,
        updated_at: payment.updated_at,
    }
}

fn payment_from_row(kind: LedgerKind, currency: Currency, row: PaymentRow) -> Result<Payment, DatabaseError> {
    Ok(Payment {
        id: PaymentId::from_uuid(row.id),
        kind,
        invoice_id: row.invoice_id.map(InvoiceId::from_uuid),
        owner: FolioOwner::from_parts(kind, row.owner_id),
        guest_id: row.guest_id.map(GuestId::from_uuid),
        amount: Money::new(row.amount, currency),
        payment_method: decode(&PAYMENT_METHODS, PaymentMethod::as_str, "payment method", &row.payment_method)?,
        reference_number: row.reference_number,
        payment_date: row.payment_date,
        status: decode(&PAYMENT_STATUSES, PaymentStatus::as_str, "payment status", &row.status)?,
        notes: row.notes,
        processed_by: UserId::from_uuid(row.processed_by),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}
