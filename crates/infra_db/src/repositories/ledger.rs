//! Ledger repository implementation
//!
//! Row-level access to the folio ledger tables. The hotel and restaurant
//! ledgers have identical table shapes under different names, so every
//! statement is rendered against a [`LedgerTables`] set. All methods run on
//! a caller-supplied connection; transaction boundaries belong to the
//! adapter.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Table names of one ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerTables {
    pub folios: &'static str,
    pub charges: &'static str,
    pub invoices: &'static str,
    pub invoice_items: &'static str,
    pub payments: &'static str,
}

impl LedgerTables {
    pub const HOTEL: LedgerTables = LedgerTables {
        folios: "folios",
        charges: "folio_charges",
        invoices: "invoices",
        invoice_items: "invoice_items",
        payments: "payments",
    };

    pub const RESTAURANT: LedgerTables = LedgerTables {
        folios: "restaurant_folios",
        charges: "restaurant_folio_charges",
        invoices: "restaurant_invoices",
        invoice_items: "restaurant_invoice_items",
        payments: "restaurant_payments",
    };
}

const FOLIO_COLUMNS: &str = "id, owner_id, guest_id, status, currency, total_charges, total_tax, \
     total_payments, balance, opened_date, closed_date, created_at, updated_at";

const CHARGE_COLUMNS: &str = "id, folio_id, charge_type, description, unit_price, quantity, discount, \
     amount, tax_rate, tax_amount, total_amount, is_taxable, charge_date, posted_by, source_type, \
     source_id, reverses_charge_id, details, created_at";

const INVOICE_COLUMNS: &str = "id, invoice_number, sequence_year, sequence_number, folio_id, owner_id, \
     guest_id, currency, subtotal, tax_amount, total_amount, paid_amount, balance_amount, status, \
     invoice_date, due_date, created_by, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, invoice_id, charge_id, charge_type, description, quantity, unit_price, \
     amount, tax_rate, tax_amount, total_price, position";

const PAYMENT_COLUMNS: &str = "id, invoice_id, owner_id, guest_id, amount, payment_method, \
     reference_number, payment_date, status, notes, processed_by, created_at, updated_at";

/// Repository for one ledger's tables
#[derive(Debug, Clone, Copy)]
pub struct LedgerRepository {
    tables: LedgerTables,
}

impl LedgerRepository {
    pub fn new(tables: LedgerTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> LedgerTables {
        self.tables
    }

    // --- folios ---

    pub async fn insert_folio(&self, conn: &mut PgConnection, row: &FolioRow) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
            self.tables.folios, FOLIO_COLUMNS
        );
        sqlx::query(&sql)
            .bind(row.id)
            .bind(row.owner_id)
            .bind(row.guest_id)
            .bind(&row.status)
            .bind(&row.currency)
            .bind(row.total_charges)
            .bind(row.total_tax)
            .bind(row.total_payments)
            .bind(row.balance)
            .bind(row.opened_date)
            .bind(row.closed_date)
            .bind(row.created_at)
            .bind(row.updated_at)
            .execute(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))?;
        Ok(())
    }

    /// Reads a folio, optionally taking a row lock until the transaction ends
    pub async fn find_folio(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        lock: bool,
    ) -> Result<Option<FolioRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1{}",
            FOLIO_COLUMNS,
            self.tables.folios,
            lock_clause(lock)
        );
        sqlx::query_as::<_, FolioRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))
    }

    pub async fn find_folio_by_owner(
        &self,
        conn: &mut PgConnection,
        owner_id: Uuid,
        lock: bool,
    ) -> Result<Option<FolioRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE owner_id = $1{}",
            FOLIO_COLUMNS,
            self.tables.folios,
            lock_clause(lock)
        );
        sqlx::query_as::<_, FolioRow>(&sql)
            .bind(owner_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))
    }

    /// Writes status and aggregates back
    pub async fn update_folio(&self, conn: &mut PgConnection, row: &FolioRow) -> Result<(), DatabaseError> {
        let sql = format!(
            "UPDATE {} SET status = $2, total_charges = $3, total_tax = $4, total_payments = $5, \
             balance = $6, closed_date = $7, updated_at = $8 WHERE id = $1",
            self.tables.folios
        );
        let result = sqlx::query(&sql)
            .bind(row.id)
            .bind(&row.status)
            .bind(row.total_charges)
            .bind(row.total_tax)
            .bind(row.total_payments)
            .bind(row.balance)
            .bind(row.closed_date)
            .bind(row.updated_at)
            .execute(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Folio", row.id));
        }
        Ok(())
    }

    // --- charges ---

    pub async fn insert_charge(&self, conn: &mut PgConnection, row: &ChargeRow) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
             $15, $16, $17, $18, $19)",
            self.tables.charges, CHARGE_COLUMNS
        );
        sqlx::query(&sql)
            .bind(row.id)
            .bind(row.folio_id)
            .bind(&row.charge_type)
            .bind(&row.description)
            .bind(row.unit_price)
            .bind(row.quantity)
            .bind(row.discount)
            .bind(row.amount)
            .bind(row.tax_rate)
            .bind(row.tax_amount)
            .bind(row.total_amount)
            .bind(row.is_taxable)
            .bind(row.charge_date)
            .bind(row.posted_by)
            .bind(&row.source_type)
            .bind(row.source_id)
            .bind(row.reverses_charge_id)
            .bind(&row.details)
            .bind(row.created_at)
            .execute(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))?;
        Ok(())
    }

    /// Charges of a folio, oldest first
    pub async fn list_charges(&self, conn: &mut PgConnection, folio_id: Uuid) -> Result<Vec<ChargeRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE folio_id = $1 ORDER BY created_at, id",
            CHARGE_COLUMNS, self.tables.charges
        );
        sqlx::query_as::<_, ChargeRow>(&sql)
            .bind(folio_id)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))
    }

    /// Charges of a folio tagged with one producer source
    pub async fn list_charges_by_source(
        &self,
        conn: &mut PgConnection,
        folio_id: Uuid,
        source_type: &str,
        source_id: Uuid,
    ) -> Result<Vec<ChargeRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE folio_id = $1 AND source_type = $2 AND source_id = $3 \
             ORDER BY created_at, id",
            CHARGE_COLUMNS, self.tables.charges
        );
        sqlx::query_as::<_, ChargeRow>(&sql)
            .bind(folio_id)
            .bind(source_type)
            .bind(source_id)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))
    }

    /// Ids of folios holding charges tagged with one producer source
    pub async fn folios_with_source(
        &self,
        conn: &mut PgConnection,
        source_type: &str,
        source_id: Uuid,
    ) -> Result<Vec<Uuid>, DatabaseError> {
        let sql = format!(
            "SELECT DISTINCT folio_id FROM {} WHERE source_type = $1 AND source_id = $2 ORDER BY folio_id",
            self.tables.charges
        );
        sqlx::query_scalar::<_, Uuid>(&sql)
            .bind(source_type)
            .bind(source_id)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))
    }

    // --- invoices ---

    /// Serialises sequence allocation for one ledger and year
    ///
    /// The advisory lock is released when the transaction ends.
    pub async fn lock_invoice_sequence(&self, conn: &mut PgConnection, key: i64) -> Result<(), DatabaseError> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(key)
            .execute(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))?;
        Ok(())
    }

    /// Highest sequence number used in `year`, zero when none
    pub async fn max_invoice_sequence(&self, conn: &mut PgConnection, year: i32) -> Result<i64, DatabaseError> {
        let sql = format!(
            "SELECT COALESCE(MAX(sequence_number), 0) FROM {} WHERE sequence_year = $1",
            self.tables.invoices
        );
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(year)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))
    }

    /// Inserts the invoice header and its items
    pub async fn insert_invoice(
        &self,
        conn: &mut PgConnection,
        row: &InvoiceRow,
        items: &[InvoiceItemRow],
    ) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
             $15, $16, $17, $18, $19)",
            self.tables.invoices, INVOICE_COLUMNS
        );
        sqlx::query(&sql)
            .bind(row.id)
            .bind(&row.invoice_number)
            .bind(row.sequence_year)
            .bind(row.sequence_number)
            .bind(row.folio_id)
            .bind(row.owner_id)
            .bind(row.guest_id)
            .bind(&row.currency)
            .bind(row.subtotal)
            .bind(row.tax_amount)
            .bind(row.total_amount)
            .bind(row.paid_amount)
            .bind(row.balance_amount)
            .bind(&row.status)
            .bind(row.invoice_date)
            .bind(row.due_date)
            .bind(row.created_by)
            .bind(row.created_at)
            .bind(row.updated_at)
            .execute(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))?;

        let item_sql = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            self.tables.invoice_items, ITEM_COLUMNS
        );
        for item in items {
            sqlx::query(&item_sql)
                .bind(item.id)
                .bind(item.invoice_id)
                .bind(item.charge_id)
                .bind(&item.charge_type)
                .bind(&item.description)
                .bind(item.quantity)
                .bind(item.unit_price)
                .bind(item.amount)
                .bind(item.tax_rate)
                .bind(item.tax_amount)
                .bind(item.total_price)
                .bind(item.position)
                .execute(&mut *conn)
                .await
                .map_err(|e| DatabaseError::from(&e))?;
        }
        Ok(())
    }

    pub async fn find_invoice(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        lock: bool,
    ) -> Result<Option<InvoiceRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1{}",
            INVOICE_COLUMNS,
            self.tables.invoices,
            lock_clause(lock)
        );
        sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))
    }

    pub async fn find_invoice_by_folio(
        &self,
        conn: &mut PgConnection,
        folio_id: Uuid,
    ) -> Result<Option<InvoiceRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE folio_id = $1",
            INVOICE_COLUMNS, self.tables.invoices
        );
        sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(folio_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))
    }

    pub async fn list_invoice_items(
        &self,
        conn: &mut PgConnection,
        invoice_id: Uuid,
    ) -> Result<Vec<InvoiceItemRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE invoice_id = $1 ORDER BY position",
            ITEM_COLUMNS, self.tables.invoice_items
        );
        sqlx::query_as::<_, InvoiceItemRow>(&sql)
            .bind(invoice_id)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))
    }

    pub async fn update_invoice_settlement(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        paid_amount: Decimal,
        balance_amount: Decimal,
        status: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let sql = format!(
            "UPDATE {} SET paid_amount = $2, balance_amount = $3, status = $4, updated_at = $5 WHERE id = $1",
            self.tables.invoices
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(paid_amount)
            .bind(balance_amount)
            .bind(status)
            .bind(updated_at)
            .execute(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Invoice", id));
        }
        Ok(())
    }

    // --- payments ---

    pub async fn insert_payment(&self, conn: &mut PgConnection, row: &PaymentRow) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
            self.tables.payments, PAYMENT_COLUMNS
        );
        sqlx::query(&sql)
            .bind(row.id)
            .bind(row.invoice_id)
            .bind(row.owner_id)
            .bind(row.guest_id)
            .bind(row.amount)
            .bind(&row.payment_method)
            .bind(&row.reference_number)
            .bind(row.payment_date)
            .bind(&row.status)
            .bind(&row.notes)
            .bind(row.processed_by)
            .bind(row.created_at)
            .bind(row.updated_at)
            .execute(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))?;
        Ok(())
    }

    pub async fn find_payment(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        lock: bool,
    ) -> Result<Option<PaymentRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1{}",
            PAYMENT_COLUMNS,
            self.tables.payments,
            lock_clause(lock)
        );
        sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))
    }

    pub async fn update_payment_status(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        status: &str,
    ) -> Result<(), DatabaseError> {
        let sql = format!(
            "UPDATE {} SET status = $2, updated_at = NOW() WHERE id = $1",
            self.tables.payments
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(status)
            .execute(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Payment", id));
        }
        Ok(())
    }

    pub async fn reference_exists(&self, conn: &mut PgConnection, reference: &str) -> Result<bool, DatabaseError> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE reference_number = $1)",
            self.tables.payments
        );
        sqlx::query_scalar::<_, bool>(&sql)
            .bind(reference)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))
    }

    /// Points an owner's completed, unbound payments at an invoice
    pub async fn bind_unapplied_payments(
        &self,
        conn: &mut PgConnection,
        owner_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Vec<PaymentRow>, DatabaseError> {
        let sql = format!(
            "UPDATE {} SET invoice_id = $2, updated_at = NOW() \
             WHERE owner_id = $1 AND invoice_id IS NULL AND status = 'completed' RETURNING {}",
            self.tables.payments, PAYMENT_COLUMNS
        );
        let mut rows = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(owner_id)
            .bind(invoice_id)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))?;
        rows.sort_by_key(|r| (r.payment_date, r.id));
        Ok(rows)
    }

    /// Sum of completed payments held by an owner
    pub async fn sum_completed_payments(&self, conn: &mut PgConnection, owner_id: Uuid) -> Result<Decimal, DatabaseError> {
        let sql = format!(
            "SELECT COALESCE(SUM(amount), 0) FROM {} WHERE owner_id = $1 AND status = 'completed'",
            self.tables.payments
        );
        sqlx::query_scalar::<_, Decimal>(&sql)
            .bind(owner_id)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))
    }

    pub async fn list_invoice_payments(
        &self,
        conn: &mut PgConnection,
        invoice_id: Uuid,
    ) -> Result<Vec<PaymentRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE invoice_id = $1 ORDER BY payment_date, id",
            PAYMENT_COLUMNS, self.tables.payments
        );
        sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(invoice_id)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))
    }

    /// A page of a guest's payments, newest first, and the total count
    pub async fn list_guest_payments(
        &self,
        conn: &mut PgConnection,
        guest_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PaymentRow>, i64), DatabaseError> {
        let count_sql = format!("SELECT COUNT(*) FROM {} WHERE guest_id = $1", self.tables.payments);
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(guest_id)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))?;

        let sql = format!(
            "SELECT {} FROM {} WHERE guest_id = $1 ORDER BY payment_date DESC, id DESC LIMIT $2 OFFSET $3",
            PAYMENT_COLUMNS, self.tables.payments
        );
        let rows = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(guest_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from(&e))?;
        Ok((rows, total))
    }
}

/// Writes one row of the shared audit log
pub async fn insert_audit(conn: &mut PgConnection, row: &AuditRow) -> Result<(), DatabaseError> {
    sqlx::query(
        "INSERT INTO billing_audit_log (id, occurred_at, actor, action, entity_type, entity_id, details) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(row.id)
    .bind(row.occurred_at)
    .bind(row.actor)
    .bind(&row.action)
    .bind(&row.entity_type)
    .bind(row.entity_id)
    .bind(&row.details)
    .execute(&mut *conn)
    .await
    .map_err(|e| DatabaseError::from(&e))?;
    Ok(())
}

/// Serialises use of one payment reference across both ledgers
///
/// Released when the transaction ends.
pub async fn lock_payment_reference(conn: &mut PgConnection, reference: &str) -> Result<(), DatabaseError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext('payment_reference'), hashtext($1))")
        .bind(reference)
        .execute(&mut *conn)
        .await
        .map_err(|e| DatabaseError::from(&e))?;
    Ok(())
}

fn lock_clause(lock: bool) -> &'static str {
    if lock {
        " FOR UPDATE"
    } else {
        ""
    }
}

/// Database row for a folio
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FolioRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub guest_id: Option<Uuid>,
    pub status: String,
    pub currency: String,
    pub total_charges: Decimal,
    pub total_tax: Decimal,
    pub total_payments: Decimal,
    pub balance: Decimal,
    pub opened_date: DateTime<Utc>,
    pub closed_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for a folio charge
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChargeRow {
    pub id: Uuid,
    pub folio_id: Uuid,
    pub charge_type: String,
    pub description: String,
    pub unit_price: Decimal,
    pub quantity: Decimal,
    pub discount: Decimal,
    pub amount: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub is_taxable: bool,
    pub charge_date: DateTime<Utc>,
    pub posted_by: Uuid,
    pub source_type: Option<String>,
    pub source_id: Option<Uuid>,
    pub reverses_charge_id: Option<Uuid>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Database row for an invoice header
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceRow {
    pub id: Uuid,
    pub invoice_number: String,
    pub sequence_year: i32,
    pub sequence_number: i64,
    pub folio_id: Uuid,
    pub owner_id: Uuid,
    pub guest_id: Option<Uuid>,
    pub currency: String,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub balance_amount: Decimal,
    pub status: String,
    pub invoice_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for an invoice line
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceItemRow {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub charge_id: Uuid,
    pub charge_type: String,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total_price: Decimal,
    pub position: i32,
}

/// Database row for a payment
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub id: Uuid,
    pub invoice_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub guest_id: Option<Uuid>,
    pub amount: Decimal,
    pub payment_method: String,
    pub reference_number: String,
    pub payment_date: DateTime<Utc>,
    pub status: String,
    pub notes: Option<String>,
    pub processed_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for an audit log entry
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuditRow {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub actor: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub details: Option<serde_json::Value>,
}
