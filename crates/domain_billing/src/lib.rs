//! Billing Domain - Folio Ledger
//!
//! This crate keeps the running bill of a hotel stay or a restaurant order
//! (the *folio*), turns it into an immutable invoice, and settles the
//! invoice with payments.
//!
//! # Ledger flow
//!
//! - Charge producers (room stays, restaurant orders, ad-hoc services,
//!   refunds) emit charge inputs
//! - The service posts them onto a folio and reconciles its totals
//! - Invoice generation freezes the folio's charges into an invoice
//! - Payments settle the invoice and reconcile the folio again
//!
//! Hotel and restaurant ledgers share the same engine; [`LedgerKind`]
//! selects which one an operation runs against.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{BillingService, ChargeInput, ChargeType, LedgerKind};
//!
//! let folio = service.create_folio(reservation_id, guest_id, actor).await?;
//! service
//!     .post_charge(LedgerKind::Hotel, folio.id, ChargeInput::new(ChargeType::Room, "Room 101", dec!(1000)), actor)
//!     .await?;
//! let invoice = service.generate_invoice(LedgerKind::Hotel, folio.id, actor).await?;
//! ```

pub mod audit;
pub mod charge;
pub mod config;
pub mod detail;
pub mod error;
pub mod folio;
pub mod invoice;
pub mod payment;
pub mod ports;
pub mod producers;
pub mod reconcile;
pub mod service;
pub mod tax;

pub use audit::{AuditAction, AuditEntry};
pub use charge::{ChargeInput, ChargeSource, ChargeType, FolioCharge, SourceType};
pub use config::{BillingConfig, TaxRateEntry, TaxRateTable};
pub use detail::{FolioDetail, InvoiceDetail, Page, PageRequest};
pub use error::{BillingError, ErrorKind};
pub use folio::{Folio, FolioOwner, FolioStatus, LedgerKind};
pub use invoice::{Invoice, InvoiceItem, InvoiceSequence, InvoiceStatus};
pub use payment::{Payment, PaymentInput, PaymentMethod, PaymentStatus};
pub use ports::{
    Directory, GuestSummary, InvoiceNotifier, LedgerStore, LedgerTransaction, MenuCatalog,
    MenuItemSummary, ReservationSummary, RoomSummary, VariantSummary,
};
pub use producers::restaurant::{GuestType, OrderDiscount, OrderLine, OrderPricing, RestaurantOrder};
pub use reconcile::FolioTotals;
pub use service::{BillingService, InvoiceDispatch, OrderPosting};
