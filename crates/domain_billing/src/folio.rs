//! Folios - a guest's running account for one reservation or restaurant order

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{Currency, FolioId, GuestId, Money, OrderId, ReservationId};

use crate::error::BillingError;
use crate::reconcile::FolioTotals;

/// Which of the two parallel ledgers a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    /// Hotel stay ledger, one folio per reservation
    Hotel,
    /// Restaurant ledger, one folio per order
    Restaurant,
}

impl LedgerKind {
    /// Prefix used for invoice numbers on this ledger
    pub fn invoice_prefix(&self) -> &'static str {
        match self {
            LedgerKind::Hotel => "INV",
            LedgerKind::Restaurant => "RINV",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerKind::Hotel => "hotel",
            LedgerKind::Restaurant => "restaurant",
        }
    }
}

/// The record a folio is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum FolioOwner {
    Reservation(ReservationId),
    RestaurantOrder(OrderId),
}

impl FolioOwner {
    pub fn kind(&self) -> LedgerKind {
        match self {
            FolioOwner::Reservation(_) => LedgerKind::Hotel,
            FolioOwner::RestaurantOrder(_) => LedgerKind::Restaurant,
        }
    }

    /// The owner's raw id, as stored in the owner column
    pub fn as_uuid(&self) -> Uuid {
        match self {
            FolioOwner::Reservation(id) => *id.as_uuid(),
            FolioOwner::RestaurantOrder(id) => *id.as_uuid(),
        }
    }

    /// Rebuilds an owner from a ledger kind and a stored owner id
    pub fn from_parts(kind: LedgerKind, id: Uuid) -> Self {
        match kind {
            LedgerKind::Hotel => FolioOwner::Reservation(ReservationId::from_uuid(id)),
            LedgerKind::Restaurant => FolioOwner::RestaurantOrder(OrderId::from_uuid(id)),
        }
    }

    pub fn reservation_id(&self) -> Option<ReservationId> {
        match self {
            FolioOwner::Reservation(id) => Some(*id),
            FolioOwner::RestaurantOrder(_) => None,
        }
    }
}

impl std::fmt::Display for FolioOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FolioOwner::Reservation(id) => write!(f, "reservation {}", id),
            FolioOwner::RestaurantOrder(id) => write!(f, "order {}", id),
        }
    }
}

/// Folio status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolioStatus {
    /// Accepting charges
    Active,
    /// Invoiced; accepts payments but no further charges
    Closed,
    /// Balance moved to another folio
    Transferred,
}

impl FolioStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FolioStatus::Active => "active",
            FolioStatus::Closed => "closed",
            FolioStatus::Transferred => "transferred",
        }
    }
}

/// A guest's running account
///
/// The four aggregates are derived data: they are only ever written from a
/// [`FolioTotals`] produced by the reconciler, which keeps
/// `balance == total_charges + total_tax - total_payments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folio {
    pub id: FolioId,
    pub owner: FolioOwner,
    pub guest_id: Option<GuestId>,
    pub status: FolioStatus,
    pub currency: Currency,
    pub total_charges: Money,
    pub total_tax: Money,
    pub total_payments: Money,
    pub balance: Money,
    pub opened_date: DateTime<Utc>,
    pub closed_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Folio {
    /// Opens an empty, active folio for `owner`
    pub fn open(owner: FolioOwner, guest_id: Option<GuestId>, currency: Currency) -> Self {
        let now = Utc::now();
        Self {
            id: FolioId::new_v7(),
            owner,
            guest_id,
            status: FolioStatus::Active,
            currency,
            total_charges: Money::zero(currency),
            total_tax: Money::zero(currency),
            total_payments: Money::zero(currency),
            balance: Money::zero(currency),
            opened_date: now,
            closed_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn kind(&self) -> LedgerKind {
        self.owner.kind()
    }

    pub fn is_active(&self) -> bool {
        self.status == FolioStatus::Active
    }

    /// Fails with `FolioClosed` unless charges may still be posted
    pub fn ensure_active(&self) -> Result<(), BillingError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(BillingError::FolioClosed(self.id))
        }
    }

    /// Overwrites the derived aggregates with a fresh reconciliation
    pub fn apply_totals(&mut self, totals: &FolioTotals) {
        self.total_charges = totals.total_charges;
        self.total_tax = totals.total_tax;
        self.total_payments = totals.total_payments;
        self.balance = totals.balance;
        self.updated_at = Utc::now();
    }

    /// Current aggregates as a [`FolioTotals`]
    pub fn totals(&self) -> FolioTotals {
        FolioTotals {
            total_charges: self.total_charges,
            total_tax: self.total_tax,
            total_payments: self.total_payments,
            balance: self.balance,
        }
    }

    /// Closes the folio; closing twice keeps the first close date
    pub fn close(&mut self, at: DateTime<Utc>) {
        if self.status == FolioStatus::Active {
            self.status = FolioStatus::Closed;
            self.closed_date = Some(at);
            self.updated_at = at;
        }
    }
}
